use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CustomerId, FarmerId, OrderId, ProductId};

/// Revision number of a stored order document, used for optimistic
/// concurrency control.
///
/// A freshly inserted document is at version 1; every successful save
/// increments it by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) of a document that does not exist yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version (1) assigned on insert.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A stored order: the full order as a JSON document plus the indexed
/// columns the store needs for lookups and uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDocument {
    /// Primary key.
    pub id: OrderId,

    /// Human-facing order number, unique across all orders.
    pub order_number: String,

    /// Buyer reference, indexed for per-customer listings.
    pub customer_id: CustomerId,

    /// Seller reference, indexed for per-farmer listings and stats.
    pub farmer_id: FarmerId,

    /// Creation time, used for newest-first ordering.
    pub created_at: DateTime<Utc>,

    /// Current revision of the document.
    pub version: Version,

    /// The order body, timeline included.
    pub body: serde_json::Value,
}

impl OrderDocument {
    /// Creates a new document builder.
    pub fn builder() -> OrderDocumentBuilder {
        OrderDocumentBuilder::default()
    }
}

/// Builder for constructing order documents.
#[derive(Debug, Default)]
pub struct OrderDocumentBuilder {
    id: Option<OrderId>,
    order_number: Option<String>,
    customer_id: Option<CustomerId>,
    farmer_id: Option<FarmerId>,
    created_at: Option<DateTime<Utc>>,
    version: Option<Version>,
    body: Option<serde_json::Value>,
}

impl OrderDocumentBuilder {
    pub fn id(mut self, id: OrderId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn order_number(mut self, order_number: impl Into<String>) -> Self {
        self.order_number = Some(order_number.into());
        self
    }

    pub fn customer_id(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn farmer_id(mut self, farmer_id: FarmerId) -> Self {
        self.farmer_id = Some(farmer_id);
        self
    }

    /// Sets the creation time. If not set, the current time will be used.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Sets the version. If not set, [`Version::first`] is used.
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the body from a serializable value.
    pub fn body<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Sets the body from a raw JSON value.
    pub fn body_raw(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Tries to build the document, returning None if required fields are missing.
    pub fn try_build(self) -> Option<OrderDocument> {
        Some(OrderDocument {
            id: self.id.unwrap_or_default(),
            order_number: self.order_number?,
            customer_id: self.customer_id?,
            farmer_id: self.farmer_id?,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            version: self.version.unwrap_or_else(Version::first),
            body: self.body?,
        })
    }
}

/// Stock-relevant view of a product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    /// Unit price in the smallest currency unit.
    pub price: i64,
    pub stock: i64,
}

impl ProductRecord {
    pub fn new(id: ProductId, name: impl Into<String>, price: i64, stock: i64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            stock,
        }
    }
}

/// A customer's shopping cart. Items are opaque to the order core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartRecord {
    pub customer_id: CustomerId,
    pub items: Vec<serde_json::Value>,
}
