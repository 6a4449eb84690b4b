//! Multi-line stock reservation with compensation.

use domain::{OrderError, OrderLine};
use record_store::RecordStore;

use crate::error::{DispatchError, Result};
use crate::ledger::StockLedger;

/// Reserves all lines of one order as a single logical unit, or none.
///
/// Lines are decremented in order; when a decrement fails at line *k*,
/// every decrement that already succeeded is compensated back before the
/// failure surfaces. The ledger is therefore left exactly as it was before
/// the call on every failure path.
pub struct ReservationCoordinator<S: RecordStore> {
    ledger: StockLedger<S>,
}

impl<S: RecordStore + Clone> Clone for ReservationCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
        }
    }
}

impl<S: RecordStore> ReservationCoordinator<S> {
    /// Creates a new reservation coordinator over the given store.
    pub fn new(store: S) -> Self {
        Self {
            ledger: StockLedger::new(store),
        }
    }

    /// Returns the underlying stock ledger.
    pub fn ledger(&self) -> &StockLedger<S> {
        &self.ledger
    }

    /// Reserves stock for every line, or for none.
    ///
    /// Fails with `InsufficientStock` naming the offending item. The caller
    /// must surface that as a conflict rather than retry automatically.
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn reserve(&self, lines: &[OrderLine]) -> Result<()> {
        if lines.is_empty() {
            return Err(DispatchError::Order(OrderError::EmptyOrder));
        }
        for line in lines {
            if line.quantity == 0 {
                return Err(DispatchError::Order(OrderError::InvalidQuantity {
                    item_id: line.item_id,
                }));
            }
        }

        for (reserved, line) in lines.iter().enumerate() {
            if let Err(e) = self.ledger.try_decrement(line.item_id, line.quantity).await {
                self.release(&lines[..reserved]).await;
                metrics::counter!("reservations_failed_total").increment(1);
                tracing::warn!(
                    item_id = %line.item_id,
                    error = %e,
                    "reservation failed, compensated prior lines"
                );
                return Err(e);
            }
        }

        metrics::counter!("reservations_total").increment(1);
        Ok(())
    }

    /// Returns every line's quantity to stock.
    ///
    /// Unconditional: increments have no precondition, and a line whose
    /// item record has vanished is logged and skipped so release can never
    /// fail the path that invoked it.
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn release(&self, lines: &[OrderLine]) {
        for line in lines {
            if let Err(e) = self.ledger.increment(line.item_id, line.quantity).await {
                tracing::error!(
                    item_id = %line.item_id,
                    quantity = line.quantity,
                    error = %e,
                    "failed to return reserved stock"
                );
            }
        }
    }
}
