//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{CustomerId, FarmerId, OrderId, ProductId};
use serde::{Deserialize, Serialize};
use store::Version;

use super::{
    DeliveryAddress, DeliverySlot, Money, NewOrder, OrderError, OrderLineItem, OrderStatus,
    PaymentMethod, PaymentStatus, TimelineEntry, TransitionPolicy,
};

/// Order aggregate root.
///
/// One order is one persisted document: line items, delivery details and
/// the status timeline live inside it. Stock and carts belong to other
/// aggregates and are only touched by the workflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    order_number: String,
    customer_id: CustomerId,
    farmer_id: FarmerId,
    items: Vec<OrderLineItem>,
    total_amount: Money,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payment_reference: Option<String>,
    delivery_address: DeliveryAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delivery_slot: Option<DeliverySlot>,
    #[serde(default)]
    delivery_fee: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confirmed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delivered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cancellation_reason: Option<String>,
    timeline: Vec<TimelineEntry>,

    /// Stored revision, owned by the repository.
    #[serde(skip)]
    version: Version,
}

/// Falls back to `default` when `note` is absent or empty. Whitespace is kept.
fn note_or(note: Option<String>, default: impl FnOnce() -> String) -> String {
    note.filter(|n| !n.is_empty()).unwrap_or_else(default)
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn farmer_id(&self) -> FarmerId {
        self.farmer_id
    }

    pub fn items(&self) -> &[OrderLineItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.payment_reference.as_deref()
    }

    pub fn delivery_address(&self) -> &DeliveryAddress {
        &self.delivery_address
    }

    pub fn delivery_slot(&self) -> Option<&DeliverySlot> {
        self.delivery_slot.as_ref()
    }

    pub fn delivery_fee(&self) -> Money {
        self.delivery_fee
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Stock held by this order, per line item.
    pub fn reserved_stock(&self) -> impl Iterator<Item = (ProductId, u32)> + '_ {
        self.items.iter().map(|item| (item.product_id, item.quantity))
    }
}

// Command methods
impl Order {
    /// Builds a freshly placed order from a validated payload.
    ///
    /// The order starts `pending` with a single "Order placed" timeline entry.
    pub fn place(new: NewOrder, order_number: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::new(),
            order_number: order_number.into(),
            customer_id: new.customer_id,
            farmer_id: new.farmer_id,
            items: new.items,
            total_amount: new.total_amount,
            status: OrderStatus::Pending,
            payment_method: new.payment_method,
            payment_status: new.payment_status,
            payment_reference: None,
            delivery_address: new.delivery_address,
            delivery_slot: new.delivery_slot,
            delivery_fee: new.delivery_fee,
            notes: new.notes,
            created_at: now,
            confirmed_at: None,
            delivered_at: None,
            cancellation_reason: None,
            timeline: vec![TimelineEntry::new(OrderStatus::Pending, now, "Order placed")],
            version: Version::initial(),
        }
    }

    /// Moves the order to `status` and appends a timeline entry.
    ///
    /// Cancellation restores stock and must go through [`Order::cancel`]
    /// via the cancellation workflow; asking for it here is rejected.
    pub fn transition(
        &mut self,
        status: OrderStatus,
        note: Option<String>,
        policy: TransitionPolicy,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::InvalidOperation {
                current_status: self.status,
                action: "change status of",
            });
        }

        if status == OrderStatus::Cancelled {
            return Err(OrderError::InvalidOperation {
                current_status: self.status,
                action: "cancel via status update",
            });
        }

        if !policy.allows(self.status, status) {
            return Err(OrderError::InvalidOperation {
                current_status: self.status,
                action: "move backward",
            });
        }

        match status {
            OrderStatus::Confirmed if self.confirmed_at.is_none() => self.confirmed_at = Some(now),
            OrderStatus::Delivered if self.delivered_at.is_none() => self.delivered_at = Some(now),
            _ => {}
        }

        self.status = status;
        let note = note_or(note, || format!("Order {status}"));
        self.timeline.push(TimelineEntry::new(status, now, note));
        Ok(())
    }

    /// Fails unless the order may still be cancelled.
    pub fn ensure_cancellable(&self) -> Result<(), OrderError> {
        if self.status.can_cancel() {
            Ok(())
        } else {
            Err(OrderError::InvalidOperation {
                current_status: self.status,
                action: "cancel",
            })
        }
    }

    /// Marks the order cancelled. Stock restoration is the caller's job.
    pub fn cancel(&mut self, reason: Option<String>, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.ensure_cancellable()?;

        let note = note_or(reason.clone(), || "Order cancelled".to_string());

        self.status = OrderStatus::Cancelled;
        self.cancellation_reason = reason;
        self.timeline
            .push(TimelineEntry::new(OrderStatus::Cancelled, now, note));
        Ok(())
    }

    /// Records payment progress. Leaves status and timeline untouched.
    ///
    /// An empty reference never clears a stored one.
    pub fn update_payment(&mut self, status: PaymentStatus, reference: Option<String>) {
        self.payment_status = status;
        if let Some(reference) = reference.filter(|r| !r.is_empty()) {
            self.payment_reference = Some(reference);
        }
    }
}
