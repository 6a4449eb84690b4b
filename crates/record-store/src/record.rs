use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EntityId;

/// Version number for a record, used for optimistic concurrency control.
///
/// Versions start at 1 for a newly inserted record and increment by 1 with
/// each successful conditional update.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) for a record that does not exist yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the first version (1) assigned on insert.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A versioned record as stored, keyed by `(kind, id)`.
///
/// The payload is the entity state as JSON; the version is bumped by the
/// store on every successful conditional update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Identity of the entity this record holds.
    pub id: EntityId,

    /// The kind of entity (e.g., "Order", "Driver").
    pub kind: String,

    /// Current version, compared on conditional updates.
    pub version: Version,

    /// The entity state as JSON.
    pub payload: serde_json::Value,

    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Creates a fresh record at the first version.
    pub fn new(kind: impl Into<String>, id: EntityId, payload: serde_json::Value) -> Self {
        Self {
            id,
            kind: kind.into(),
            version: Version::first(),
            payload,
            updated_at: Utc::now(),
        }
    }

    /// Creates a record from a serializable state.
    pub fn from_state<T: Serialize>(
        kind: impl Into<String>,
        id: EntityId,
        state: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(kind, id, serde_json::to_value(state)?))
    }

    /// Deserializes the payload into a typed state.
    pub fn to_state<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}
