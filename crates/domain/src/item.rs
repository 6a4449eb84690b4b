//! Catalog item with its available stock.

use common::EntityId;
use record_store::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::Entity;

/// Errors produced by stock operations on an item.
#[derive(Debug, Error)]
pub enum ItemError {
    /// The requested quantity exceeds what is available.
    #[error(
        "Insufficient stock for item {item_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        item_id: EntityId,
        requested: u32,
        available: u32,
    },
}

/// A catalog item.
///
/// `available_quantity` is only ever mutated through `deduct`/`restock`,
/// which the stock ledger calls inside a conditional-update loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    id: EntityId,
    name: String,
    available_quantity: u32,
    #[serde(skip)]
    version: Version,
}

impl Entity for Item {
    fn kind() -> &'static str {
        "Item"
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl Item {
    /// Creates a new item with an initial stock level.
    pub fn new(name: impl Into<String>, initial_quantity: u32) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            available_quantity: initial_quantity,
            version: Version::initial(),
        }
    }

    /// Returns the item name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the quantity currently available.
    pub fn available_quantity(&self) -> u32 {
        self.available_quantity
    }

    /// Checked subtraction from the available stock.
    ///
    /// Fails without mutating when `quantity` exceeds what is available.
    pub fn deduct(&mut self, quantity: u32) -> Result<(), ItemError> {
        if quantity > self.available_quantity {
            return Err(ItemError::InsufficientStock {
                item_id: self.id,
                requested: quantity,
                available: self.available_quantity,
            });
        }
        self.available_quantity -= quantity;
        Ok(())
    }

    /// Adds quantity back to the available stock. No precondition.
    pub fn restock(&mut self, quantity: u32) {
        self.available_quantity += quantity;
    }
}
