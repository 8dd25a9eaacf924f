use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    CartRecord, CustomerId, OrderDocument, OrderId, OrderQuery, ProductId, ProductRecord,
    Result, StoreError, Version,
    store::{CartStore, OrderStore, ProductCatalog, SaveOptions},
};

#[derive(Default)]
struct OrderTable {
    documents: HashMap<OrderId, OrderDocument>,
    order_numbers: HashSet<String>,
}

/// In-memory order store for tests and single-process deployments.
///
/// This implementation keeps all documents in memory and provides
/// the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    table: Arc<RwLock<OrderTable>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.table.read().await.documents.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, mut document: OrderDocument) -> Result<Version> {
        let mut table = self.table.write().await;

        if table.documents.contains_key(&document.id) {
            return Err(StoreError::DuplicateOrder(document.id));
        }
        // Unique index simulation
        if table.order_numbers.contains(&document.order_number) {
            return Err(StoreError::DuplicateOrderNumber(document.order_number));
        }

        document.version = Version::first();
        table.order_numbers.insert(document.order_number.clone());
        table.documents.insert(document.id, document);

        Ok(Version::first())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<OrderDocument>> {
        let table = self.table.read().await;
        Ok(table.documents.get(&order_id).cloned())
    }

    async fn save(&self, mut document: OrderDocument, options: SaveOptions) -> Result<Version> {
        let mut table = self.table.write().await;

        let stored = table
            .documents
            .get_mut(&document.id)
            .ok_or(StoreError::OrderNotFound(document.id))?;

        if let Some(expected) = options.expected_version
            && stored.version != expected
        {
            metrics::counter!("store_version_conflicts_total").increment(1);
            tracing::debug!(
                order_id = %document.id,
                %expected,
                actual = %stored.version,
                "rejected stale order write"
            );
            return Err(StoreError::ConcurrencyConflict {
                order_id: document.id,
                expected,
                actual: stored.version,
            });
        }

        // Indexed columns are immutable after insert
        let new_version = stored.version.next();
        document.version = new_version;
        document.order_number = stored.order_number.clone();
        document.created_at = stored.created_at;
        *stored = document;

        Ok(new_version)
    }

    async fn query(&self, query: OrderQuery) -> Result<Vec<OrderDocument>> {
        let table = self.table.read().await;
        let mut documents: Vec<_> = table
            .documents
            .values()
            .filter(|d| {
                if let Some(id) = query.customer_id
                    && d.customer_id != id
                {
                    return false;
                }
                if let Some(id) = query.farmer_id
                    && d.farmer_id != id
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        // Newest first, id as tie-breaker for a stable order
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let offset = query.offset.unwrap_or(0);
        let documents = documents.into_iter().skip(offset);
        let documents = match query.limit {
            Some(limit) => documents.take(limit).collect(),
            None => documents.collect(),
        };

        Ok(documents)
    }
}

/// In-memory product catalog.
///
/// Check-and-set of stock happens under a single write lock, which gives
/// the same atomicity as the conditional `UPDATE` of the PostgreSQL store.
#[derive(Clone, Default)]
pub struct InMemoryProductCatalog {
    products: Arc<RwLock<HashMap<ProductId, ProductRecord>>>,
}

impl InMemoryProductCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product listing.
    pub async fn upsert(&self, product: ProductRecord) {
        self.products.write().await.insert(product.id, product);
    }

    /// Removes a product listing.
    pub async fn remove(&self, product_id: ProductId) -> Option<ProductRecord> {
        self.products.write().await.remove(&product_id)
    }

    /// Returns the current stock of a product, if listed.
    pub async fn stock_of(&self, product_id: ProductId) -> Option<i64> {
        self.products
            .read()
            .await
            .get(&product_id)
            .map(|p| p.stock)
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn find_by_id(&self, product_id: ProductId) -> Result<Option<ProductRecord>> {
        Ok(self.products.read().await.get(&product_id).cloned())
    }

    async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<i64> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&product_id)
            .ok_or(StoreError::ProductNotFound(product_id))?;
        product.stock += delta;
        Ok(product.stock)
    }

    async fn decrement_if_available(&self, product_id: ProductId, quantity: u32) -> Result<i64> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&product_id)
            .ok_or(StoreError::ProductNotFound(product_id))?;

        if product.stock < i64::from(quantity) {
            return Err(StoreError::InsufficientStock {
                product_id,
                requested: quantity,
                available: product.stock,
            });
        }

        product.stock -= i64::from(quantity);
        Ok(product.stock)
    }
}

/// In-memory cart store.
#[derive(Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<CustomerId, CartRecord>>>,
}

impl InMemoryCartStore {
    /// Creates a new empty cart store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the items in a customer's cart, creating it if needed.
    pub async fn set_items(&self, customer_id: CustomerId, items: Vec<serde_json::Value>) {
        self.carts.write().await.insert(
            customer_id,
            CartRecord {
                customer_id,
                items,
            },
        );
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn clear(&self, customer_id: CustomerId) -> Result<bool> {
        let mut carts = self.carts.write().await;
        match carts.get_mut(&customer_id) {
            Some(cart) => {
                cart.items.clear();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, customer_id: CustomerId) -> Result<Option<CartRecord>> {
        Ok(self.carts.read().await.get(&customer_id).cloned())
    }
}
