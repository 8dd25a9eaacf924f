use crate::{CustomerId, FarmerId};

/// Builder for order listing queries.
///
/// Results are always ordered newest first (by creation time).
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// Filter by buyer.
    pub customer_id: Option<CustomerId>,

    /// Filter by seller.
    pub farmer_id: Option<FarmerId>,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,

    /// Number of orders to skip.
    pub offset: Option<usize>,
}

impl OrderQuery {
    /// Creates a new empty query (matches every order).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for one customer's orders.
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Default::default()
        }
    }

    /// Creates a query for one farmer's orders.
    pub fn for_farmer(farmer_id: FarmerId) -> Self {
        Self {
            farmer_id: Some(farmer_id),
            ..Default::default()
        }
    }

    pub fn customer_id(mut self, id: CustomerId) -> Self {
        self.customer_id = Some(id);
        self
    }

    pub fn farmer_id(mut self, id: FarmerId) -> Self {
        self.farmer_id = Some(id);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}
