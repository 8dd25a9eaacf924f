//! Shared identifier types used across the order service crates.

mod types;

pub use types::{CustomerId, FarmerId, IdParseError, OrderId, ProductId};
