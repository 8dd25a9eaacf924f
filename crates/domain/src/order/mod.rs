//! Order aggregate and related types.

mod aggregate;
mod number;
mod request;
mod state;
mod stats;
mod value_objects;

pub use aggregate::Order;
pub use number::OrderNumberGenerator;
pub use request::{
    AddressRequest, CreateOrderRequest, LineItemRequest, LocationRequest, NewOrder, SlotRequest,
    ValidationError, validate_create_order,
};
pub use state::{OrderStatus, TransitionPolicy};
pub use stats::FarmerStats;
pub use value_objects::{
    DeliveryAddress, DeliverySlot, GeoPoint, Money, OrderLineItem, PaymentMethod, PaymentStatus,
    TimelineEntry,
};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Payload failed structural validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Status label is not one of the seven known statuses.
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Payment status label is not one of the known values.
    #[error("Invalid payment status: {0}")]
    InvalidPaymentStatus(String),

    /// Payment method label is not one of the known values.
    #[error("Invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    /// Operation not permitted in the current status.
    #[error("Cannot {action} order in {current_status} status")]
    InvalidOperation {
        current_status: OrderStatus,
        action: &'static str,
    },
}
