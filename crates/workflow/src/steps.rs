//! Order creation workflow constants.

/// The workflow type identifier for order creation.
pub const WORKFLOW_TYPE: &str = "OrderCreation";

/// Step name: decrement stock for every line item.
pub const STEP_RESERVE_STOCK: &str = "reserve_stock";

/// Step name: insert the order document.
pub const STEP_PERSIST_ORDER: &str = "persist_order";

/// Step name: empty the customer's cart. Failure does not fail the workflow.
pub const STEP_CLEAR_CART: &str = "clear_cart";
