//! Service facade over the order workflows.

use std::sync::Arc;

use chrono::Utc;
use common::{CustomerId, FarmerId, OrderId};
use domain::{
    CreateOrderRequest, FarmerStats, Order, OrderNumberGenerator, OrderRepository, OrderStatus,
    PaymentStatus, TransitionPolicy,
};
use store::{CartStore, OrderStore, ProductCatalog};

use crate::cancellation::CancellationWorkflow;
use crate::creation::OrderCreationWorkflow;
use crate::error::Result;
use crate::ledger::InventoryLedger;

/// Entry point for every order operation.
///
/// Generic over the three collaborating stores so the same service runs
/// against in-memory stores in tests and PostgreSQL in production.
pub struct OrderService<O, P, C> {
    repository: OrderRepository<O>,
    creation: OrderCreationWorkflow<O, P, C>,
    cancellation: CancellationWorkflow<O, P>,
    policy: TransitionPolicy,
}

impl<O, P, C> OrderService<O, P, C>
where
    O: OrderStore + Clone,
    P: ProductCatalog + Clone,
    C: CartStore,
{
    /// Creates a service with the permissive transition policy.
    pub fn new(orders: O, catalog: P, carts: C) -> Self {
        let repository = OrderRepository::new(orders);
        let ledger = InventoryLedger::new(catalog);
        let numbers = Arc::new(OrderNumberGenerator::new());

        Self {
            creation: OrderCreationWorkflow::new(
                repository.clone(),
                ledger.clone(),
                carts,
                numbers,
            ),
            cancellation: CancellationWorkflow::new(repository.clone(), ledger),
            repository,
            policy: TransitionPolicy::default(),
        }
    }

    /// Sets which status moves are accepted.
    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the creation workflow, for callers that track workflow runs.
    pub fn creation(&self) -> &OrderCreationWorkflow<O, P, C> {
        &self.creation
    }

    /// Creates an order from a client payload.
    #[tracing::instrument(skip_all)]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order> {
        self.creation.execute(request).await
    }

    /// Gets an order by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        Ok(self.repository.load_existing(order_id).await?)
    }

    /// All orders placed by a customer, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        Ok(self.repository.find_by_customer(customer_id).await?)
    }

    /// All orders received by a farmer, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders_by_farmer(&self, farmer_id: FarmerId) -> Result<Vec<Order>> {
        Ok(self.repository.find_by_farmer(farmer_id).await?)
    }

    /// Moves an order to the status named by `status`.
    ///
    /// `cancelled` is handed to the cancellation workflow so stock is
    /// restored; the note becomes the cancellation reason.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: &str,
        note: Option<String>,
    ) -> Result<Order> {
        let mut order = self.repository.load_existing(order_id).await?;
        let status: OrderStatus = status.parse()?;

        if status == OrderStatus::Cancelled {
            return self.cancellation.execute(order_id, note).await;
        }

        let from = order.status();
        order.transition(status, note, self.policy, Utc::now())?;
        self.repository.save(&mut order).await?;

        metrics::counter!(
            "order_status_transitions_total",
            "from" => from.as_str(),
            "to" => status.as_str()
        )
        .increment(1);
        tracing::info!(%order_id, %from, to = %status, "order status updated");

        Ok(order)
    }

    /// Records payment progress. Status and timeline are untouched.
    #[tracing::instrument(skip(self))]
    pub async fn update_payment(
        &self,
        order_id: OrderId,
        payment_status: &str,
        payment_reference: Option<String>,
    ) -> Result<Order> {
        let mut order = self.repository.load_existing(order_id).await?;
        let payment_status: PaymentStatus = payment_status.parse()?;

        order.update_payment(payment_status, payment_reference);
        self.repository.save(&mut order).await?;

        tracing::info!(%order_id, %payment_status, "payment status updated");
        Ok(order)
    }

    /// Cancels an order and restores its stock.
    pub async fn cancel_order(&self, order_id: OrderId, reason: Option<String>) -> Result<Order> {
        self.cancellation.execute(order_id, reason).await
    }

    /// Order counts and paid revenue for a farmer.
    #[tracing::instrument(skip(self))]
    pub async fn get_farmer_stats(&self, farmer_id: FarmerId) -> Result<FarmerStats> {
        let orders = self.repository.find_by_farmer(farmer_id).await?;
        Ok(FarmerStats::from_orders(&orders))
    }
}

