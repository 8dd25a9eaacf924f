//! Integration tests for the Order aggregate.
//!
//! These tests drive orders through their full lifecycle against the
//! in-memory store: validation, placement, status changes, cancellation,
//! payment updates and farmer statistics.

use chrono::Utc;
use domain::{
    CreateOrderRequest, CustomerId, DomainError, FarmerId, FarmerStats, Money, Order, OrderError,
    OrderNumberGenerator, OrderRepository, OrderStatus, PaymentStatus, ProductId,
    TransitionPolicy,
};
use serde_json::json;
use store::{InMemoryOrderStore, StoreError, Version};

fn create_repository() -> OrderRepository<InMemoryOrderStore> {
    OrderRepository::new(InMemoryOrderStore::new())
}

fn request(customer_id: CustomerId, farmer_id: FarmerId) -> CreateOrderRequest {
    serde_json::from_value(json!({
        "customerId": customer_id.to_string(),
        "farmerId": farmer_id.to_string(),
        "items": [
            {
                "productId": ProductId::new().to_string(),
                "name": "Organic Tomatoes",
                "price": 1200,
                "quantity": 2,
                "subtotal": 2400
            },
            {
                "productId": ProductId::new().to_string(),
                "name": "Sweet Peppers",
                "price": 500,
                "quantity": 1,
                "subtotal": 500
            }
        ],
        "totalAmount": 2900,
        "paymentMethod": "online",
        "deliveryAddress": {
            "street": "1 Farm Rd",
            "city": "Lagos",
            "state": "LA",
            "phone": "08000000000"
        },
        "deliverySlot": {"date": "2026-11-02T09:00:00Z", "timeSlot": "09:00-12:00"},
        "deliveryFee": 350
    }))
    .unwrap()
}

async fn place(
    repo: &OrderRepository<InMemoryOrderStore>,
    generator: &OrderNumberGenerator,
    customer_id: CustomerId,
    farmer_id: FarmerId,
) -> Order {
    let new = request(customer_id, farmer_id).validate().unwrap();
    let mut order = Order::place(new, generator.next(), Utc::now());
    repo.insert(&mut order).await.unwrap();
    order
}

mod order_lifecycle {
    use super::*;

    #[tokio::test]
    async fn complete_order_lifecycle() {
        let repo = create_repository();
        let generator = OrderNumberGenerator::new();
        let order = place(&repo, &generator, CustomerId::new(), FarmerId::new()).await;

        assert_eq!(order.version(), Version::first());
        assert_eq!(order.items().len(), 2);
        assert_eq!(order.total_amount(), Money::from_minor(2900));
        assert_eq!(order.delivery_fee(), Money::from_minor(350));
        assert!(order.delivery_slot().is_some());

        let path = [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ];
        for status in path {
            let mut current = repo.load_existing(order.id()).await.unwrap();
            current
                .transition(status, None, TransitionPolicy::ForwardOnly, Utc::now())
                .unwrap();
            repo.save(&mut current).await.unwrap();
        }

        let delivered = repo.load_existing(order.id()).await.unwrap();
        assert_eq!(delivered.status(), OrderStatus::Delivered);
        assert_eq!(delivered.version(), Version::new(6));
        assert!(delivered.confirmed_at().is_some());
        assert!(delivered.delivered_at().is_some());

        let history: Vec<_> = delivered.timeline().iter().map(|e| e.status).collect();
        assert_eq!(
            history,
            vec![
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Preparing,
                OrderStatus::Ready,
                OrderStatus::Shipped,
                OrderStatus::Delivered,
            ]
        );
    }

    #[tokio::test]
    async fn cancelled_order_is_persisted_with_reason() {
        let repo = create_repository();
        let generator = OrderNumberGenerator::new();
        let order = place(&repo, &generator, CustomerId::new(), FarmerId::new()).await;

        let mut current = repo.load_existing(order.id()).await.unwrap();
        current
            .cancel(Some("Out of delivery range".to_string()), Utc::now())
            .unwrap();
        repo.save(&mut current).await.unwrap();

        let stored = repo.load_existing(order.id()).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Cancelled);
        assert_eq!(stored.cancellation_reason(), Some("Out of delivery range"));
        assert_eq!(stored.timeline().len(), 2);
    }
}

mod state_transitions {
    use super::*;

    #[tokio::test]
    async fn cannot_change_status_after_delivery() {
        let repo = create_repository();
        let generator = OrderNumberGenerator::new();
        let mut order = place(&repo, &generator, CustomerId::new(), FarmerId::new()).await;

        order
            .transition(OrderStatus::Delivered, None, TransitionPolicy::Permissive, Utc::now())
            .unwrap();
        repo.save(&mut order).await.unwrap();

        let result = order.transition(
            OrderStatus::Pending,
            None,
            TransitionPolicy::Permissive,
            Utc::now(),
        );
        assert!(matches!(result, Err(OrderError::InvalidOperation { .. })));

        let result = order.cancel(None, Utc::now());
        assert!(matches!(
            result,
            Err(OrderError::InvalidOperation {
                current_status: OrderStatus::Delivered,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn unknown_status_label_is_rejected_before_touching_order() {
        let repo = create_repository();
        let generator = OrderNumberGenerator::new();
        let order = place(&repo, &generator, CustomerId::new(), FarmerId::new()).await;

        let parsed = "bogus".parse::<OrderStatus>();
        assert!(matches!(parsed, Err(OrderError::InvalidStatus(_))));

        let stored = repo.load_existing(order.id()).await.unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn timeline_grows_by_one_per_operation() {
        let repo = create_repository();
        let generator = OrderNumberGenerator::new();
        let mut order = place(&repo, &generator, CustomerId::new(), FarmerId::new()).await;

        let steps = [
            OrderStatus::Confirmed,
            OrderStatus::Pending,
            OrderStatus::Preparing,
            OrderStatus::Preparing,
        ];
        for (i, status) in steps.into_iter().enumerate() {
            order
                .transition(status, None, TransitionPolicy::Permissive, Utc::now())
                .unwrap();
            repo.save(&mut order).await.unwrap();
            assert_eq!(order.timeline().len(), i + 2);
        }
        order.cancel(None, Utc::now()).unwrap();
        repo.save(&mut order).await.unwrap();

        let stored = repo.load_existing(order.id()).await.unwrap();
        assert_eq!(stored.timeline().len(), 6);
        assert_eq!(stored.timeline()[5].status, OrderStatus::Cancelled);
    }
}

mod payment {
    use super::*;

    #[tokio::test]
    async fn payment_update_leaves_status_and_timeline() {
        let repo = create_repository();
        let generator = OrderNumberGenerator::new();
        let mut order = place(&repo, &generator, CustomerId::new(), FarmerId::new()).await;

        order.update_payment(PaymentStatus::Paid, Some("PSK-9981".to_string()));
        repo.save(&mut order).await.unwrap();
        order.update_payment(PaymentStatus::Paid, None);
        repo.save(&mut order).await.unwrap();

        let stored = repo.load_existing(order.id()).await.unwrap();
        assert_eq!(stored.payment_status(), PaymentStatus::Paid);
        assert_eq!(stored.payment_reference(), Some("PSK-9981"));
        assert_eq!(stored.status(), OrderStatus::Pending);
        assert_eq!(stored.timeline().len(), 1);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn concurrent_modification_detected() {
        let repo = create_repository();
        let generator = OrderNumberGenerator::new();
        let order = place(&repo, &generator, CustomerId::new(), FarmerId::new()).await;

        let mut a = repo.load_existing(order.id()).await.unwrap();
        let mut b = repo.load_existing(order.id()).await.unwrap();

        a.transition(OrderStatus::Confirmed, None, TransitionPolicy::Permissive, Utc::now())
            .unwrap();
        b.update_payment(PaymentStatus::Failed, None);

        repo.save(&mut a).await.unwrap();
        let result = repo.save(&mut b).await;

        assert!(matches!(
            result,
            Err(DomainError::Store(StoreError::ConcurrencyConflict { .. }))
        ));
    }

    #[tokio::test]
    async fn duplicate_order_number_rejected_by_store() {
        let repo = create_repository();
        let generator = OrderNumberGenerator::with_node(7);

        let new = request(CustomerId::new(), FarmerId::new()).validate().unwrap();
        let mut first = Order::place(new.clone(), generator.next_at(1), Utc::now());
        repo.insert(&mut first).await.unwrap();

        let mut second = Order::place(new, first.order_number(), Utc::now());
        let result = repo.insert(&mut second).await;

        assert!(matches!(
            result,
            Err(DomainError::Store(StoreError::DuplicateOrderNumber(_)))
        ));
    }
}

mod statistics {
    use super::*;

    #[tokio::test]
    async fn farmer_stats_over_stored_orders() {
        let repo = create_repository();
        let generator = OrderNumberGenerator::new();
        let farmer = FarmerId::new();

        let mut paid = place(&repo, &generator, CustomerId::new(), farmer).await;
        paid.update_payment(PaymentStatus::Paid, None);
        repo.save(&mut paid).await.unwrap();

        let mut cancelled = place(&repo, &generator, CustomerId::new(), farmer).await;
        cancelled.update_payment(PaymentStatus::Paid, None);
        cancelled.cancel(None, Utc::now()).unwrap();
        repo.save(&mut cancelled).await.unwrap();

        place(&repo, &generator, CustomerId::new(), farmer).await;
        place(&repo, &generator, CustomerId::new(), FarmerId::new()).await;

        let orders = repo.find_by_farmer(farmer).await.unwrap();
        let stats = FarmerStats::from_orders(&orders);

        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.pending_orders, 2);
        assert_eq!(stats.cancelled_orders, 1);
        assert_eq!(stats.total_revenue, Money::from_minor(2900));
    }
}
