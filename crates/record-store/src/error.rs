use thiserror::Error;

use crate::{EntityId, Version};

/// Errors that can occur when interacting with the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional update or delete lost the race: the expected version
    /// did not match the version currently stored.
    #[error(
        "Version conflict for {kind} {id}: expected version {expected}, found {actual}"
    )]
    VersionConflict {
        kind: String,
        id: EntityId,
        expected: Version,
        actual: Version,
    },

    /// An insert collided with an existing record of the same kind and id.
    #[error("Duplicate record: {kind} {id} already exists")]
    DuplicateKey { kind: String, id: EntityId },

    /// The record was not found in the store.
    #[error("Record not found: {kind} {id}")]
    NotFound { kind: String, id: EntityId },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if this error is a lost compare-and-swap race that the
    /// caller may retry against fresh state.
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
