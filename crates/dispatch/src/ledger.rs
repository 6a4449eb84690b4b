//! Stock ledger over the item repository.

use common::EntityId;
use domain::{Item, Repository};
use record_store::RecordStore;

use crate::error::{DispatchError, Result};

/// Tracks available quantity per catalog item.
///
/// Decrement is a single atomic check-and-subtract: the check runs inside
/// the conditional-update loop, so it always holds against the quantity the
/// write commits over. Two concurrent callers can never both reserve past
/// the available stock.
pub struct StockLedger<S: RecordStore> {
    items: Repository<S, Item>,
}

impl<S: RecordStore + Clone> Clone for StockLedger<S> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<S: RecordStore> StockLedger<S> {
    /// Creates a new stock ledger over the given store.
    pub fn new(store: S) -> Self {
        Self {
            items: Repository::new(store),
        }
    }

    /// Adds a new item to the catalog with an initial stock level.
    #[tracing::instrument(skip(self, name))]
    pub async fn create_item(&self, name: impl Into<String>, initial_quantity: u32) -> Result<Item> {
        let mut item = Item::new(name, initial_quantity);
        self.items.insert(&mut item).await?;
        Ok(item)
    }

    /// Loads an item by id.
    pub async fn get_item(&self, item_id: EntityId) -> Result<Item> {
        self.items.load(item_id).await.map_err(Into::into)
    }

    /// Lists all catalog items.
    pub async fn list_items(&self) -> Result<Vec<Item>> {
        self.items.list().await.map_err(Into::into)
    }

    /// Atomically subtracts `quantity` from the item's available stock.
    ///
    /// Fails with `InsufficientStock` when the item does not hold enough;
    /// on failure nothing is mutated.
    #[tracing::instrument(skip(self))]
    pub async fn try_decrement(&self, item_id: EntityId, quantity: u32) -> Result<()> {
        self.items
            .try_update(item_id, |item| {
                item.deduct(quantity).map_err(DispatchError::from)
            })
            .await?;

        metrics::counter!("stock_decrements_total").increment(1);
        Ok(())
    }

    /// Adds `quantity` back to the item's available stock. No precondition;
    /// safe to retry.
    #[tracing::instrument(skip(self))]
    pub async fn increment(&self, item_id: EntityId, quantity: u32) -> Result<()> {
        self.items
            .try_update(item_id, |item| -> std::result::Result<(), DispatchError> {
                item.restock(quantity);
                Ok(())
            })
            .await?;

        metrics::counter!("stock_increments_total").increment(1);
        Ok(())
    }
}
