//! Entity trait and repository over the record store.

use std::marker::PhantomData;

use common::EntityId;
use record_store::{Record, RecordStore, StoreError, Version};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::DomainError;

/// Trait for persistent entities.
///
/// An entity is the current state of one business object, stored as a
/// versioned record. The version is managed by the repository and is not
/// part of the serialized state.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Returns the entity kind name used as the record kind.
    fn kind() -> &'static str;

    /// Returns the entity's unique identifier.
    fn id(&self) -> EntityId;

    /// Returns the record version this entity was loaded at.
    fn version(&self) -> Version;

    /// Sets the record version.
    ///
    /// Called by the repository after loading or writing.
    fn set_version(&mut self, version: Version);
}

/// Typed repository over the record store.
///
/// All writes to an existing entity go through `try_update` or `delete_if`:
/// a load → mutate → conditional-write loop that retries on a lost
/// compare-and-swap race, re-running the caller's closure against fresh
/// state each attempt. Callers therefore never act on a stale read.
pub struct Repository<S, T>
where
    S: RecordStore,
    T: Entity,
{
    store: S,
    _phantom: PhantomData<T>,
}

impl<S, T> Clone for Repository<S, T>
where
    S: RecordStore + Clone,
    T: Entity,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<S, T> Repository<S, T>
where
    S: RecordStore,
    T: Entity,
{
    /// Creates a new repository with the given record store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Inserts a new entity.
    ///
    /// Fails if a record with the same kind and id already exists.
    pub async fn insert(&self, entity: &mut T) -> Result<(), DomainError> {
        let record = Record::from_state(T::kind(), entity.id(), entity)?;
        self.store.insert(record).await?;
        entity.set_version(Version::first());
        Ok(())
    }

    /// Loads an entity, returning None if it doesn't exist.
    pub async fn find(&self, id: EntityId) -> Result<Option<T>, DomainError> {
        match self.store.get(T::kind(), id).await? {
            Some(record) => {
                let mut entity: T = record.to_state()?;
                entity.set_version(record.version);
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    /// Loads an entity, failing with `NotFound` if it doesn't exist.
    pub async fn load(&self, id: EntityId) -> Result<T, DomainError> {
        self.find(id).await?.ok_or(DomainError::NotFound {
            kind: T::kind(),
            id,
        })
    }

    /// Writes the entity back with a single conditional attempt.
    ///
    /// Fails with a version conflict if another writer got there first;
    /// use `try_update` when the caller wants the retry loop.
    pub async fn save(&self, entity: &mut T) -> Result<(), DomainError> {
        let payload = serde_json::to_value(&entity)?;
        let new_version = self
            .store
            .update(T::kind(), entity.id(), entity.version(), payload)
            .await?;
        entity.set_version(new_version);
        Ok(())
    }

    /// Loads, mutates, and conditionally writes an entity, retrying on a
    /// lost compare-and-swap race.
    ///
    /// The closure is re-run against freshly loaded state on every attempt,
    /// so its checks always hold at the moment the write commits. A closure
    /// error aborts without writing.
    pub async fn try_update<E, F>(&self, id: EntityId, mut apply: F) -> Result<T, E>
    where
        E: From<DomainError>,
        F: FnMut(&mut T) -> Result<(), E>,
    {
        loop {
            let mut entity = self.load(id).await.map_err(E::from)?;
            apply(&mut entity)?;

            match self.save(&mut entity).await {
                Ok(()) => return Ok(entity),
                // Lost race or record deleted underneath us: reload and
                // re-apply; a deletion surfaces as NotFound on the reload.
                Err(DomainError::Store(e))
                    if e.is_version_conflict() || matches!(e, StoreError::NotFound { .. }) =>
                {
                    metrics::counter!("repository_cas_retries_total", "kind" => T::kind())
                        .increment(1);
                    tracing::debug!(kind = T::kind(), %id, "conditional update retry");
                    continue;
                }
                Err(e) => return Err(E::from(e)),
            }
        }
    }

    /// Conditionally deletes an entity after the predicate approves it,
    /// retrying on a lost compare-and-swap race.
    ///
    /// The predicate is re-checked against fresh state on every attempt, so
    /// the record can only be deleted in a state the predicate accepted.
    /// Returns the entity as it was at deletion.
    pub async fn delete_if<E, F>(&self, id: EntityId, mut check: F) -> Result<T, E>
    where
        E: From<DomainError>,
        F: FnMut(&T) -> Result<(), E>,
    {
        loop {
            let entity = self.load(id).await.map_err(E::from)?;
            check(&entity)?;

            match self.store.delete(T::kind(), id, entity.version()).await {
                Ok(()) => return Ok(entity),
                Err(e)
                    if e.is_version_conflict() || matches!(e, StoreError::NotFound { .. }) =>
                {
                    metrics::counter!("repository_cas_retries_total", "kind" => T::kind())
                        .increment(1);
                    tracing::debug!(kind = T::kind(), %id, "conditional delete retry");
                    continue;
                }
                Err(e) => return Err(E::from(DomainError::Store(e))),
            }
        }
    }

    /// Lists all entities of this kind.
    pub async fn list(&self) -> Result<Vec<T>, DomainError> {
        let records = self.store.list(T::kind()).await?;
        let mut entities = Vec::with_capacity(records.len());
        for record in records {
            let mut entity: T = record.to_state()?;
            entity.set_version(record.version);
            entities.push(entity);
        }
        Ok(entities)
    }
}
