//! Stock reads and adjustments on behalf of the order workflows.

use common::ProductId;
use store::{ProductCatalog, StoreError};

/// Result of a read-only stock check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    /// True if the current stock covers the requested quantity.
    pub available: bool,
    pub current_stock: i64,
}

/// The only writer of product stock inside the order core.
///
/// Decrements go through the catalog's conditional update so stock can
/// never be driven below zero, even by concurrent orders.
#[derive(Debug, Clone)]
pub struct InventoryLedger<P> {
    catalog: P,
}

impl<P: ProductCatalog> InventoryLedger<P> {
    pub fn new(catalog: P) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &P {
        &self.catalog
    }

    /// Checks whether `quantity` units could be taken right now.
    #[tracing::instrument(skip(self))]
    pub async fn check_availability(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> store::Result<Availability> {
        let product = self
            .catalog
            .find_by_id(product_id)
            .await?
            .ok_or(StoreError::ProductNotFound(product_id))?;

        Ok(Availability {
            available: product.stock >= i64::from(quantity),
            current_stock: product.stock,
        })
    }

    /// Takes `quantity` units, failing with `InsufficientStock` instead of
    /// going negative.
    #[tracing::instrument(skip(self))]
    pub async fn decrement(&self, product_id: ProductId, quantity: u32) -> store::Result<i64> {
        match self.catalog.decrement_if_available(product_id, quantity).await {
            Ok(stock) => {
                metrics::counter!(
                    "stock_adjustments_total",
                    "direction" => "decrement",
                    "outcome" => "applied"
                )
                .increment(1);
                tracing::debug!(%product_id, quantity, stock, "stock decremented");
                Ok(stock)
            }
            Err(e) => {
                metrics::counter!(
                    "stock_adjustments_total",
                    "direction" => "decrement",
                    "outcome" => "rejected"
                )
                .increment(1);
                tracing::info!(%product_id, quantity, error = %e, "stock decrement rejected");
                Err(e)
            }
        }
    }

    /// Returns `quantity` units to stock. No upper bound.
    #[tracing::instrument(skip(self))]
    pub async fn increment(&self, product_id: ProductId, quantity: u32) -> store::Result<i64> {
        match self.catalog.adjust_stock(product_id, i64::from(quantity)).await {
            Ok(stock) => {
                metrics::counter!(
                    "stock_adjustments_total",
                    "direction" => "increment",
                    "outcome" => "applied"
                )
                .increment(1);
                tracing::debug!(%product_id, quantity, stock, "stock restored");
                Ok(stock)
            }
            Err(e) => {
                metrics::counter!(
                    "stock_adjustments_total",
                    "direction" => "increment",
                    "outcome" => "failed"
                )
                .increment(1);
                tracing::error!(%product_id, quantity, error = %e, "stock restoration failed");
                Err(e)
            }
        }
    }
}
