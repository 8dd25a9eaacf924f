//! Workflow error types.

use common::{OrderId, ProductId};
use domain::{DomainError, OrderError, OrderStatus, ValidationError};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the order workflows and the service facade.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Creation payload failed structural validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A line item references a product the catalog doesn't know.
    #[error("Product {name} not found")]
    ProductNotFound { product_id: ProductId, name: String },

    /// Not enough stock to cover a line item.
    #[error("Insufficient stock for {name}. Available: {available}")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        requested: u32,
        available: i64,
    },

    /// Status label is not one of the known statuses.
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Payment status label is not one of the known values.
    #[error("Invalid payment status: {0}")]
    InvalidPaymentStatus(String),

    /// Operation not permitted in the order's current status.
    #[error("Cannot {action} order in {current_status} status")]
    InvalidOperation {
        current_status: OrderStatus,
        action: &'static str,
    },

    /// Another writer saved the order first.
    #[error("Order {0} was modified concurrently")]
    ConcurrencyConflict(OrderId),

    /// Store error.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WorkflowError {
    /// Attaches the line item's name to a stock lookup or decrement failure.
    pub fn for_line_item(err: StoreError, name: &str) -> Self {
        match err {
            StoreError::ProductNotFound(product_id) => WorkflowError::ProductNotFound {
                product_id,
                name: name.to_string(),
            },
            StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => WorkflowError::InsufficientStock {
                product_id,
                name: name.to_string(),
                requested,
                available,
            },
            other => other.into(),
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OrderNotFound(id) => WorkflowError::OrderNotFound(id),
            StoreError::ConcurrencyConflict { order_id, .. } => {
                WorkflowError::ConcurrencyConflict(order_id)
            }
            StoreError::Serialization(e) => WorkflowError::Serialization(e),
            other => WorkflowError::Store(other),
        }
    }
}

impl From<OrderError> for WorkflowError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(e) => WorkflowError::Validation(e),
            OrderError::InvalidStatus(s) => WorkflowError::InvalidStatus(s),
            OrderError::InvalidPaymentStatus(s) => WorkflowError::InvalidPaymentStatus(s),
            OrderError::InvalidPaymentMethod(_) => WorkflowError::Validation(
                ValidationError::new("paymentMethod", "must be one of [cod, online, paystack]"),
            ),
            OrderError::InvalidOperation {
                current_status,
                action,
            } => WorkflowError::InvalidOperation {
                current_status,
                action,
            },
        }
    }
}

impl From<DomainError> for WorkflowError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Store(e) => e.into(),
            DomainError::Order(e) => e.into(),
            DomainError::OrderNotFound(id) => WorkflowError::OrderNotFound(id),
            DomainError::Serialization(e) => WorkflowError::Serialization(e),
        }
    }
}

/// Convenience type alias for workflow results.
pub type Result<T> = std::result::Result<T, WorkflowError>;
