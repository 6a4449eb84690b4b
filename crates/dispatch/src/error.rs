//! Dispatch error types.

use common::EntityId;
use domain::{AssignmentError, DomainError, DriverError, ItemError, OrderError, VehicleError};
use record_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the coordinators.
///
/// The conflict variants always name the specific item or resource that
/// blocked the operation so the caller can react to it.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Stock reservation failed for an item; the ledger was compensated
    /// back to its prior state.
    #[error(
        "Insufficient stock for item {item_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        item_id: EntityId,
        requested: u32,
        available: u32,
    },

    /// An order rule was violated (illegal transition, payment gate,
    /// invalid lines).
    #[error(transparent)]
    Order(#[from] OrderError),

    /// An assignment status change violates the forward-only table.
    #[error(transparent)]
    Assignment(#[from] AssignmentError),

    /// The requested driver is not available.
    #[error(transparent)]
    DriverUnavailable(#[from] DriverError),

    /// The requested vehicle is not available.
    #[error(transparent)]
    VehicleUnavailable(#[from] VehicleError),

    /// The order already has an assignment that has not been delivered.
    #[error("Order {order_id} already has an active delivery assignment")]
    ActiveAssignmentExists { order_id: EntityId },

    /// A referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: EntityId },

    /// Record store error.
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<DomainError> for DispatchError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound { kind, id } => DispatchError::NotFound { kind, id },
            DomainError::Order(e) => DispatchError::Order(e),
            DomainError::Store(e) => DispatchError::Store(e),
            DomainError::Serialization(e) => DispatchError::Serialization(e),
        }
    }
}

impl From<ItemError> for DispatchError {
    fn from(e: ItemError) -> Self {
        match e {
            ItemError::InsufficientStock {
                item_id,
                requested,
                available,
            } => DispatchError::InsufficientStock {
                item_id,
                requested,
                available,
            },
        }
    }
}

/// Convenience type alias for coordinator results.
pub type Result<T> = std::result::Result<T, DispatchError>;
