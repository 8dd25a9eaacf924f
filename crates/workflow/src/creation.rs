//! Order creation as a compensated step sequence.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use common::ProductId;
use domain::{CreateOrderRequest, Order, OrderNumberGenerator, OrderRepository, validate_create_order};
use store::{CartStore, OrderStore, ProductCatalog};

use crate::error::{Result, WorkflowError};
use crate::ledger::InventoryLedger;
use crate::run::WorkflowRun;
use crate::steps::{STEP_CLEAR_CART, STEP_PERSIST_ORDER, STEP_RESERVE_STOCK, WORKFLOW_TYPE};

/// Validates a creation payload, reserves stock, persists the order and
/// clears the customer's cart.
///
/// Nothing is written until every line item has passed the stock check.
/// If reserving or persisting fails, every decrement already applied is
/// restored in reverse order before the error is returned.
pub struct OrderCreationWorkflow<O, P, C> {
    repository: OrderRepository<O>,
    ledger: InventoryLedger<P>,
    carts: C,
    numbers: Arc<OrderNumberGenerator>,
}

impl<O, P, C> OrderCreationWorkflow<O, P, C>
where
    O: OrderStore,
    P: ProductCatalog,
    C: CartStore,
{
    pub fn new(
        repository: OrderRepository<O>,
        ledger: InventoryLedger<P>,
        carts: C,
        numbers: Arc<OrderNumberGenerator>,
    ) -> Self {
        Self {
            repository,
            ledger,
            carts,
            numbers,
        }
    }

    /// Creates an order and returns it as persisted.
    pub async fn execute(&self, request: CreateOrderRequest) -> Result<Order> {
        self.execute_with(request, &mut WorkflowRun::new()).await
    }

    /// Like [`execute`](Self::execute), recording progress into `run`.
    #[tracing::instrument(skip_all, fields(workflow_type = WORKFLOW_TYPE))]
    pub async fn execute_with(
        &self,
        request: CreateOrderRequest,
        run: &mut WorkflowRun,
    ) -> Result<Order> {
        let started = std::time::Instant::now();

        // 1. Preconditions: nothing below this block writes anything
        let new_order = validate_create_order(request)?;

        // Lines naming the same product are checked against their combined quantity
        let mut requested: Vec<(ProductId, &str, u32)> = Vec::with_capacity(new_order.items.len());
        let mut positions: HashMap<ProductId, usize> = HashMap::new();
        for item in &new_order.items {
            match positions.get(&item.product_id) {
                Some(&pos) => requested[pos].2 = requested[pos].2.saturating_add(item.quantity),
                None => {
                    positions.insert(item.product_id, requested.len());
                    requested.push((item.product_id, item.name.as_str(), item.quantity));
                }
            }
        }

        for &(product_id, name, quantity) in &requested {
            let availability = self
                .ledger
                .check_availability(product_id, quantity)
                .await
                .map_err(|e| WorkflowError::for_line_item(e, name))?;

            if !availability.available {
                return Err(WorkflowError::InsufficientStock {
                    product_id,
                    name: name.to_string(),
                    requested: quantity,
                    available: availability.current_stock,
                });
            }
        }

        // 2. Build the order. Locations without coordinates were already
        // dropped during validation.
        let mut order = Order::place(new_order, self.numbers.next(), Utc::now());
        run.start();

        // 3. Reserve stock
        tracing::info!(step = STEP_RESERVE_STOCK, order_number = %order.order_number(), "workflow step started");
        for item in order.items() {
            match self.ledger.decrement(item.product_id, item.quantity).await {
                Ok(_) => run.record_reservation(item.product_id, item.quantity),
                Err(e) => {
                    let err = WorkflowError::for_line_item(e, &item.name);
                    self.compensate(run, STEP_RESERVE_STOCK, &err).await;
                    return Err(err);
                }
            }
        }
        run.step_completed(STEP_RESERVE_STOCK);

        // 4. Persist
        tracing::info!(step = STEP_PERSIST_ORDER, "workflow step started");
        if let Err(e) = self.repository.insert(&mut order).await {
            let err = WorkflowError::from(e);
            self.compensate(run, STEP_PERSIST_ORDER, &err).await;
            return Err(err);
        }
        run.step_completed(STEP_PERSIST_ORDER);

        // 5. Clear cart, best-effort
        match self.carts.clear(order.customer_id()).await {
            Ok(true) => tracing::debug!(customer_id = %order.customer_id(), "cart cleared"),
            Ok(false) => {
                tracing::debug!(customer_id = %order.customer_id(), "no cart to clear")
            }
            Err(e) => tracing::warn!(
                customer_id = %order.customer_id(),
                error = %e,
                "failed to clear cart after order creation"
            ),
        }
        run.step_completed(STEP_CLEAR_CART);
        run.complete();

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("order_creation_duration_seconds").record(duration);
        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id(),
            order_number = %order.order_number(),
            duration,
            "order created"
        );

        Ok(order)
    }

    /// Restores every decrement applied so far, most recent first.
    ///
    /// Restoration failures are logged and counted; the triggering error is
    /// what the caller sees.
    async fn compensate(&self, run: &mut WorkflowRun, step: &'static str, cause: &WorkflowError) {
        let undo = run.step_failed(step, cause.to_string());
        metrics::counter!("order_creation_compensations_total", "step" => step).increment(1);
        tracing::warn!(step, reason = %cause, reservations = undo.len(), "compensating order creation");

        for (product_id, quantity) in undo {
            if let Err(e) = self.ledger.increment(product_id, quantity).await {
                tracing::error!(
                    %product_id,
                    quantity,
                    error = %e,
                    "compensation failed to restore stock"
                );
            }
        }

        run.compensated();
    }
}

#[cfg(test)]
mod tests {
    use common::{CustomerId, FarmerId, ProductId};
    use domain::{OrderStatus, PaymentStatus};
    use serde_json::json;
    use store::{InMemoryCartStore, InMemoryOrderStore, InMemoryProductCatalog, ProductRecord};

    use super::*;
    use crate::state::WorkflowState;

    struct Fixture {
        workflow: OrderCreationWorkflow<InMemoryOrderStore, InMemoryProductCatalog, InMemoryCartStore>,
        orders: InMemoryOrderStore,
        catalog: InMemoryProductCatalog,
    }

    fn setup() -> Fixture {
        let orders = InMemoryOrderStore::new();
        let catalog = InMemoryProductCatalog::new();
        let workflow = OrderCreationWorkflow::new(
            OrderRepository::new(orders.clone()),
            InventoryLedger::new(catalog.clone()),
            InMemoryCartStore::new(),
            Arc::new(OrderNumberGenerator::new()),
        );
        Fixture {
            workflow,
            orders,
            catalog,
        }
    }

    async fn product(catalog: &InMemoryProductCatalog, name: &str, stock: i64) -> ProductId {
        let id = ProductId::new();
        catalog.upsert(ProductRecord::new(id, name, 1200, stock)).await;
        id
    }

    fn request(items: &[(ProductId, &str, u32)]) -> CreateOrderRequest {
        let items: Vec<_> = items
            .iter()
            .map(|(id, name, quantity)| {
                json!({
                    "productId": id.to_string(),
                    "name": name,
                    "price": 1200,
                    "quantity": quantity,
                    "subtotal": 1200 * quantity
                })
            })
            .collect();

        serde_json::from_value(json!({
            "customerId": CustomerId::new().to_string(),
            "farmerId": FarmerId::new().to_string(),
            "items": items,
            "totalAmount": 2400,
            "paymentMethod": "cod",
            "deliveryAddress": {
                "street": "1 Farm Rd",
                "city": "Lagos",
                "state": "LA",
                "phone": "08000000000"
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_happy_path() {
        let fx = setup();
        let tomatoes = product(&fx.catalog, "Organic Tomatoes", 100).await;

        let mut run = WorkflowRun::new();
        let order = fx
            .workflow
            .execute_with(request(&[(tomatoes, "Organic Tomatoes", 2)]), &mut run)
            .await
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert!(order.order_number().starts_with("FS"));
        assert_eq!(fx.catalog.stock_of(tomatoes).await, Some(98));
        assert_eq!(fx.orders.order_count().await, 1);

        assert_eq!(run.state(), WorkflowState::Completed);
        assert_eq!(
            run.completed_steps(),
            &[STEP_RESERVE_STOCK, STEP_PERSIST_ORDER, STEP_CLEAR_CART]
        );
    }

    #[tokio::test]
    async fn test_precondition_failure_writes_nothing() {
        let fx = setup();
        let tomatoes = product(&fx.catalog, "Organic Tomatoes", 100).await;
        let okra = product(&fx.catalog, "Okra", 1).await;

        let mut run = WorkflowRun::new();
        let result = fx
            .workflow
            .execute_with(
                request(&[(tomatoes, "Organic Tomatoes", 2), (okra, "Okra", 5)]),
                &mut run,
            )
            .await;

        assert!(matches!(
            result,
            Err(WorkflowError::InsufficientStock { available: 1, requested: 5, .. })
        ));
        assert_eq!(run.state(), WorkflowState::NotStarted);
        assert_eq!(fx.catalog.stock_of(tomatoes).await, Some(100));
        assert_eq!(fx.catalog.stock_of(okra).await, Some(1));
        assert_eq!(fx.orders.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let fx = setup();

        let result = fx
            .workflow
            .execute(request(&[(ProductId::new(), "Ghost Pepper", 1)]))
            .await;

        match result {
            Err(WorkflowError::ProductNotFound { name, .. }) => assert_eq!(name, "Ghost Pepper"),
            other => panic!("expected ProductNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_repeated_product_is_checked_against_combined_quantity() {
        let fx = setup();
        let yams = product(&fx.catalog, "Yams", 100).await;

        let mut run = WorkflowRun::new();
        let result = fx
            .workflow
            .execute_with(request(&[(yams, "Yams", 60), (yams, "Yams", 60)]), &mut run)
            .await;

        match result {
            Err(err @ WorkflowError::InsufficientStock { .. }) => {
                assert!(matches!(
                    err,
                    WorkflowError::InsufficientStock { requested: 120, available: 100, .. }
                ));
                assert!(err.to_string().contains("Available: 100"));
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(run.state(), WorkflowState::NotStarted);
        assert_eq!(fx.catalog.stock_of(yams).await, Some(100));
        assert_eq!(fx.orders.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_repeated_product_within_stock_is_reserved_per_line() {
        let fx = setup();
        let yams = product(&fx.catalog, "Yams", 100).await;

        fx.workflow
            .execute(request(&[(yams, "Yams", 40), (yams, "Yams", 60)]))
            .await
            .unwrap();

        assert_eq!(fx.catalog.stock_of(yams).await, Some(0));
    }

    /// Catalog that delists one product as soon as another is decremented.
    #[derive(Clone)]
    struct DelistingCatalog {
        inner: InMemoryProductCatalog,
        trigger: ProductId,
        delisted: ProductId,
    }

    #[async_trait::async_trait]
    impl ProductCatalog for DelistingCatalog {
        async fn find_by_id(&self, product_id: ProductId) -> store::Result<Option<ProductRecord>> {
            self.inner.find_by_id(product_id).await
        }

        async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> store::Result<i64> {
            self.inner.adjust_stock(product_id, delta).await
        }

        async fn decrement_if_available(
            &self,
            product_id: ProductId,
            quantity: u32,
        ) -> store::Result<i64> {
            let remaining = self.inner.decrement_if_available(product_id, quantity).await?;
            if product_id == self.trigger {
                self.inner.remove(self.delisted).await;
            }
            Ok(remaining)
        }
    }

    #[tokio::test]
    async fn test_product_removed_mid_reservation_restores_earlier_decrements() {
        let orders = InMemoryOrderStore::new();
        let catalog = InMemoryProductCatalog::new();
        let tomatoes = product(&catalog, "Organic Tomatoes", 100).await;
        let peppers = product(&catalog, "Scotch Bonnet", 50).await;
        let okra = product(&catalog, "Okra", 30).await;

        let workflow = OrderCreationWorkflow::new(
            OrderRepository::new(orders.clone()),
            InventoryLedger::new(DelistingCatalog {
                inner: catalog.clone(),
                trigger: peppers,
                delisted: okra,
            }),
            InMemoryCartStore::new(),
            Arc::new(OrderNumberGenerator::new()),
        );

        let mut run = WorkflowRun::new();
        let result = workflow
            .execute_with(
                request(&[
                    (tomatoes, "Organic Tomatoes", 2),
                    (peppers, "Scotch Bonnet", 5),
                    (okra, "Okra", 3),
                ]),
                &mut run,
            )
            .await;

        match result {
            Err(WorkflowError::ProductNotFound { product_id, name }) => {
                assert_eq!(product_id, okra);
                assert_eq!(name, "Okra");
            }
            other => panic!("expected ProductNotFound, got {other:?}"),
        }
        assert_eq!(run.state(), WorkflowState::Failed);
        assert_eq!(run.failed_step(), Some(STEP_RESERVE_STOCK));
        assert!(run.completed_steps().is_empty());
        assert_eq!(catalog.stock_of(tomatoes).await, Some(100));
        assert_eq!(catalog.stock_of(peppers).await, Some(50));
        assert_eq!(catalog.stock_of(okra).await, None);
        assert_eq!(orders.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_validation_failure_reports_field() {
        let fx = setup();
        let mut payload = request(&[(ProductId::new(), "Okra", 1)]);
        payload.payment_method = Some("barter".to_string());

        let result = fx.workflow.execute(payload).await;
        assert!(matches!(result, Err(WorkflowError::Validation(e)) if e.field == "paymentMethod"));
    }
}
