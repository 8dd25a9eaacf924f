//! Loading and persisting orders through an [`OrderStore`].

use common::{CustomerId, FarmerId, OrderId};
use store::{OrderDocument, OrderStore, OrderStoreExt, SaveOptions};

use crate::error::DomainError;
use crate::order::Order;

/// Maps [`Order`] aggregates to stored documents and back.
///
/// Every save carries the version the order was loaded at, so two writers
/// racing on the same order cannot silently drop each other's timeline
/// entries: the loser gets `ConcurrencyConflict`.
#[derive(Debug, Clone)]
pub struct OrderRepository<S> {
    store: S,
}

impl<S: OrderStore> OrderRepository<S> {
    /// Creates a new repository over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn to_document(order: &Order) -> Result<OrderDocument, DomainError> {
        Ok(OrderDocument {
            id: order.id(),
            order_number: order.order_number().to_string(),
            customer_id: order.customer_id(),
            farmer_id: order.farmer_id(),
            created_at: order.created_at(),
            version: order.version(),
            body: serde_json::to_value(order)?,
        })
    }

    fn from_document(document: OrderDocument) -> Result<Order, DomainError> {
        let mut order: Order = serde_json::from_value(document.body)?;
        order.set_version(document.version);
        Ok(order)
    }

    /// Persists a newly placed order and stamps it with its first version.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    pub async fn insert(&self, order: &mut Order) -> Result<(), DomainError> {
        let version = self.store.insert(Self::to_document(order)?).await?;
        order.set_version(version);
        Ok(())
    }

    /// Loads an order, returning None if it doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self, order_id: OrderId) -> Result<Option<Order>, DomainError> {
        self.store
            .get(order_id)
            .await?
            .map(Self::from_document)
            .transpose()
    }

    /// Loads an order, failing with `OrderNotFound` if it doesn't exist.
    pub async fn load_existing(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.load(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))
    }

    /// Writes back a modified order, checked against the version it was loaded at.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id(), version = %order.version()))]
    pub async fn save(&self, order: &mut Order) -> Result<(), DomainError> {
        let options = SaveOptions::expect_version(order.version());
        let version = self.store.save(Self::to_document(order)?, options).await?;
        order.set_version(version);
        Ok(())
    }

    /// All orders placed by a customer, newest first.
    pub async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>, DomainError> {
        self.store
            .find_by_customer(customer_id)
            .await?
            .into_iter()
            .map(Self::from_document)
            .collect()
    }

    /// All orders received by a farmer, newest first.
    pub async fn find_by_farmer(&self, farmer_id: FarmerId) -> Result<Vec<Order>, DomainError> {
        self.store
            .find_by_farmer(farmer_id)
            .await?
            .into_iter()
            .map(Self::from_document)
            .collect()
    }
}
