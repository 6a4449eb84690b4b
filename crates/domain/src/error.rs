//! Domain error types.

use common::EntityId;
use record_store::StoreError;
use thiserror::Error;

use crate::order::OrderError;

/// Errors that can occur during domain persistence operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the record store.
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    /// An order rule was violated.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Entity not found.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: EntityId },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
