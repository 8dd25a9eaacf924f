pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::{CustomerId, FarmerId, OrderId, ProductId};
pub use document::{CartRecord, OrderDocument, OrderDocumentBuilder, ProductRecord, Version};
pub use error::{Result, StoreError};
pub use memory::{InMemoryCartStore, InMemoryOrderStore, InMemoryProductCatalog};
pub use postgres::{PostgresCartStore, PostgresOrderStore, PostgresProductCatalog, run_migrations};
pub use query::OrderQuery;
pub use store::{CartStore, OrderStore, OrderStoreExt, ProductCatalog, SaveOptions};
