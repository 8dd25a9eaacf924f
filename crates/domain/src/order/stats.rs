//! Per-farmer order statistics.

use serde::{Deserialize, Serialize};

use super::{Money, Order, OrderStatus, PaymentStatus};

/// Order counts and revenue for one farmer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerStats {
    pub total_orders: usize,
    pub pending_orders: usize,
    pub confirmed_orders: usize,
    pub delivered_orders: usize,
    pub cancelled_orders: usize,

    /// Sum of `totalAmount` over paid, non-cancelled orders, capped at
    /// `i64::MAX`.
    pub total_revenue: Money,
}

impl FarmerStats {
    /// Aggregates statistics in one pass over the farmer's orders.
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        orders.into_iter().fold(Self::default(), |mut stats, order| {
            stats.total_orders += 1;
            match order.status() {
                OrderStatus::Pending => stats.pending_orders += 1,
                OrderStatus::Confirmed => stats.confirmed_orders += 1,
                OrderStatus::Delivered => stats.delivered_orders += 1,
                OrderStatus::Cancelled => stats.cancelled_orders += 1,
                _ => {}
            }
            if order.status() != OrderStatus::Cancelled
                && order.payment_status() == PaymentStatus::Paid
            {
                stats.total_revenue = stats.total_revenue.saturating_add(order.total_amount());
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{CustomerId, FarmerId, ProductId};

    use super::*;
    use crate::order::{DeliveryAddress, NewOrder, OrderLineItem, PaymentMethod, TransitionPolicy};

    fn order(total: i64) -> Order {
        let new = NewOrder {
            customer_id: CustomerId::new(),
            farmer_id: FarmerId::new(),
            items: vec![OrderLineItem::new(
                ProductId::new(),
                "Cassava",
                Money::from_minor(total),
                1,
            )],
            total_amount: Money::from_minor(total),
            payment_method: PaymentMethod::Online,
            payment_status: PaymentStatus::Pending,
            delivery_address: DeliveryAddress::new("2 Market St", "Ibadan", "OY", "08011111111"),
            delivery_slot: None,
            delivery_fee: Money::zero(),
            notes: None,
        };
        Order::place(new, format!("FS{total}"), Utc::now())
    }

    #[test]
    fn test_empty() {
        assert_eq!(FarmerStats::from_orders(&Vec::<Order>::new()), FarmerStats::default());
    }

    #[test]
    fn test_counts_and_revenue() {
        let pending_unpaid = order(100);

        let mut delivered_paid = order(2000);
        delivered_paid
            .transition(OrderStatus::Delivered, None, TransitionPolicy::Permissive, Utc::now())
            .unwrap();
        delivered_paid.update_payment(PaymentStatus::Paid, None);

        let mut confirmed_paid = order(500);
        confirmed_paid
            .transition(OrderStatus::Confirmed, None, TransitionPolicy::Permissive, Utc::now())
            .unwrap();
        confirmed_paid.update_payment(PaymentStatus::Paid, None);

        let mut cancelled_paid = order(9000);
        cancelled_paid.update_payment(PaymentStatus::Paid, None);
        cancelled_paid.cancel(None, Utc::now()).unwrap();

        let mut shipped = order(300);
        shipped
            .transition(OrderStatus::Shipped, None, TransitionPolicy::Permissive, Utc::now())
            .unwrap();

        let orders = [
            pending_unpaid,
            delivered_paid,
            confirmed_paid,
            cancelled_paid,
            shipped,
        ];
        let stats = FarmerStats::from_orders(&orders);

        assert_eq!(stats.total_orders, 5);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.confirmed_orders, 1);
        assert_eq!(stats.delivered_orders, 1);
        assert_eq!(stats.cancelled_orders, 1);
        assert_eq!(stats.total_revenue, Money::from_minor(2500));
    }

    #[test]
    fn test_revenue_saturates_on_huge_totals() {
        let mut first = order(i64::MAX);
        first.update_payment(PaymentStatus::Paid, None);
        let mut second = order(i64::MAX);
        second.update_payment(PaymentStatus::Paid, None);

        let stats = FarmerStats::from_orders(&[first, second]);

        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.total_revenue, Money::from_minor(i64::MAX));
        assert!(!stats.total_revenue.is_negative());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(FarmerStats::default()).unwrap();
        assert_eq!(json["totalOrders"], 0);
        assert_eq!(json["totalRevenue"], 0);
    }
}
