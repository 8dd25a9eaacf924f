use thiserror::Error;

use crate::{OrderId, ProductId, Version};

/// Errors that can occur when interacting with the document stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A concurrency conflict occurred when saving an order.
    /// The expected version did not match the stored version.
    #[error(
        "Concurrency conflict for order {order_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: Version,
        actual: Version,
    },

    /// The order was not found in the store.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// An order with the same id already exists.
    #[error("Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// The order number is already taken by another order.
    #[error("Duplicate order number: {0}")]
    DuplicateOrderNumber(String),

    /// The product was not found in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A conditional decrement would have driven stock below zero.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: i64,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
