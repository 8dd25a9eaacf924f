//! Domain layer for the farmstand order service.
//!
//! This crate provides:
//! - the Order aggregate with its status state machine and timeline
//! - creation payload validation
//! - order number generation and per-farmer statistics
//! - a repository mapping orders to versioned store documents

pub mod error;
pub mod order;
pub mod repository;

pub use common::{CustomerId, FarmerId, OrderId, ProductId};
pub use error::DomainError;
pub use order::{
    CreateOrderRequest, DeliveryAddress, DeliverySlot, FarmerStats, GeoPoint, Money, NewOrder,
    Order, OrderError, OrderLineItem, OrderNumberGenerator, OrderStatus, PaymentMethod,
    PaymentStatus, TimelineEntry, TransitionPolicy, ValidationError, validate_create_order,
};
pub use repository::OrderRepository;
