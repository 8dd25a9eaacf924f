//! Order cancellation with stock restoration.

use chrono::Utc;
use common::OrderId;
use domain::{Order, OrderRepository};
use store::{OrderStore, ProductCatalog};

use crate::error::Result;
use crate::ledger::InventoryLedger;

/// Cancels an order and puts its line-item quantities back into stock.
///
/// The cancelled order is saved first, under the version check, and only
/// then is stock restored. Two concurrent cancellations of the same order
/// therefore restore stock once: the loser fails on the save.
pub struct CancellationWorkflow<O, P> {
    repository: OrderRepository<O>,
    ledger: InventoryLedger<P>,
}

impl<O, P> CancellationWorkflow<O, P>
where
    O: OrderStore,
    P: ProductCatalog,
{
    pub fn new(repository: OrderRepository<O>, ledger: InventoryLedger<P>) -> Self {
        Self { repository, ledger }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, order_id: OrderId, reason: Option<String>) -> Result<Order> {
        let mut order = self.repository.load_existing(order_id).await?;

        order.cancel(reason, Utc::now())?;
        self.repository.save(&mut order).await?;

        // Best-effort per line item: one failed restoration does not stop the rest
        let mut failed = 0usize;
        for (product_id, quantity) in order.reserved_stock() {
            if self.ledger.increment(product_id, quantity).await.is_err() {
                failed += 1;
                tracing::error!(
                    %order_id,
                    %product_id,
                    quantity,
                    "stock not restored for cancelled order"
                );
            }
        }

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(
            %order_id,
            order_number = %order.order_number(),
            restoration_failures = failed,
            "order cancelled"
        );

        Ok(order)
    }
}
