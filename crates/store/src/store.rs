use async_trait::async_trait;

use crate::{
    CartRecord, CustomerId, FarmerId, OrderDocument, OrderId, OrderQuery, ProductId,
    ProductRecord, Result, Version,
};

/// Options for saving an order document.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Expected stored version for optimistic concurrency control.
    /// If None, the document is overwritten unconditionally (use with caution).
    pub expected_version: Option<Version>,
}

impl SaveOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stored document to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }
}

/// Persistence for order documents.
///
/// Each order is one document; the embedded timeline is written together
/// with the rest of the order in a single store operation.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order document at [`Version::first`].
    ///
    /// Fails with `DuplicateOrder` if the id exists and with
    /// `DuplicateOrderNumber` if the order number is taken.
    async fn insert(&self, document: OrderDocument) -> Result<Version>;

    /// Retrieves an order document by id.
    async fn get(&self, order_id: OrderId) -> Result<Option<OrderDocument>>;

    /// Replaces the body of an existing order document.
    ///
    /// If `options.expected_version` is set, the save fails with
    /// `ConcurrencyConflict` when the stored version differs.
    ///
    /// Returns the new version of the document.
    async fn save(&self, document: OrderDocument, options: SaveOptions) -> Result<Version>;

    /// Retrieves order documents matching a query, newest first.
    async fn query(&self, query: OrderQuery) -> Result<Vec<OrderDocument>>;
}

/// Extension trait providing convenience lookups for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// All orders placed by a customer, newest first.
    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<OrderDocument>> {
        self.query(OrderQuery::for_customer(customer_id)).await
    }

    /// All orders received by a farmer, newest first.
    async fn find_by_farmer(&self, farmer_id: FarmerId) -> Result<Vec<OrderDocument>> {
        self.query(OrderQuery::for_farmer(farmer_id)).await
    }

    /// Checks if an order exists.
    async fn order_exists(&self, order_id: OrderId) -> Result<bool> {
        Ok(self.get(order_id).await?.is_some())
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}

/// Product catalog collaborator. Only the stock counter is written.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Looks up a product by id.
    async fn find_by_id(&self, product_id: ProductId) -> Result<Option<ProductRecord>>;

    /// Adds `delta` to the product's stock unconditionally.
    ///
    /// Returns the stock after the adjustment, or `ProductNotFound`.
    async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<i64>;

    /// Atomically decrements stock by `quantity` only if the result stays
    /// at or above zero.
    ///
    /// Returns the stock after the decrement, `InsufficientStock` if the
    /// floor would be crossed, or `ProductNotFound`.
    async fn decrement_if_available(&self, product_id: ProductId, quantity: u32) -> Result<i64>;
}

/// Cart collaborator.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Empties the customer's cart.
    ///
    /// Returns false if the customer has no cart.
    async fn clear(&self, customer_id: CustomerId) -> Result<bool>;

    /// Retrieves the customer's cart.
    async fn get(&self, customer_id: CustomerId) -> Result<Option<CartRecord>>;
}
