//! Order workflows for the farmstand order service.
//!
//! Order creation runs as a compensated step sequence:
//! 1. Reserve stock for every line item
//! 2. Persist the order
//! 3. Clear the customer's cart (best-effort)
//!
//! If reserving or persisting fails, stock already taken is restored in
//! reverse order. Cancellation restores stock per line item.

pub mod cancellation;
pub mod creation;
pub mod error;
pub mod ledger;
pub mod run;
pub mod service;
pub mod state;
pub mod steps;

pub use cancellation::CancellationWorkflow;
pub use creation::OrderCreationWorkflow;
pub use error::{Result, WorkflowError};
pub use ledger::{Availability, InventoryLedger};
pub use run::WorkflowRun;
pub use service::OrderService;
pub use state::WorkflowState;
