use async_trait::async_trait;

use crate::{EntityId, Record, Result, Version};

/// Core trait for record store implementations.
///
/// A record store persists current-state records keyed by `(kind, id)` and
/// exposes conditional (compare-and-swap) update and delete primitives.
/// Callers never get a raw read-then-write API: every mutation of an
/// existing record states the version it read, and the store applies the
/// write only if that version is still current.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a new record.
    ///
    /// Fails with `DuplicateKey` if a record with the same kind and id
    /// already exists.
    async fn insert(&self, record: Record) -> Result<()>;

    /// Retrieves a record by kind and id.
    ///
    /// Returns None if the record does not exist.
    async fn get(&self, kind: &str, id: EntityId) -> Result<Option<Record>>;

    /// Conditionally replaces a record's payload.
    ///
    /// The write applies only if the stored version equals `expected`;
    /// otherwise fails with `VersionConflict` carrying the actual version,
    /// or `NotFound` if the record has been deleted. Returns the new
    /// version (`expected.next()`).
    async fn update(
        &self,
        kind: &str,
        id: EntityId,
        expected: Version,
        payload: serde_json::Value,
    ) -> Result<Version>;

    /// Conditionally deletes a record.
    ///
    /// The delete applies only if the stored version equals `expected`;
    /// otherwise fails with `VersionConflict` or `NotFound`.
    async fn delete(&self, kind: &str, id: EntityId, expected: Version) -> Result<()>;

    /// Lists all records of a kind.
    async fn list(&self, kind: &str) -> Result<Vec<Record>>;
}
