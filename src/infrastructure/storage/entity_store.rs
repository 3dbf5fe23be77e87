//! Typed entity store over a raw key-value backend

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::storage::{validate_storage_key, KeyValueStore, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Reads and writes JSON-encoded entities of one kind
///
/// Entities are addressed by their `StorageKey`; the store never caches across calls.
pub struct EntityStore<E>
where
    E: StorageEntity,
{
    backend: Arc<dyn KeyValueStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityStore<E>
where
    E: StorageEntity,
{
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for EntityStore<E>
where
    E: StorageEntity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("backend", &self.backend.backend_name())
            .finish()
    }
}

impl<E> EntityStore<E>
where
    E: StorageEntity,
{
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            _entity: PhantomData,
        }
    }

    /// Loads the entity, failing with `NotFound` when absent
    pub async fn get(&self, key: &E::Key) -> Result<E, DomainError> {
        self.find(key)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("{} not found", key)))
    }

    /// Loads the entity if it exists
    pub async fn find(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let storage_key = key.storage_key();
        debug!(key = %storage_key, "Loading entity");

        match self.backend.get(&storage_key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Loads the entity together with the exact bytes it was decoded from
    pub async fn find_raw(&self, key: &E::Key) -> Result<Option<(E, Vec<u8>)>, DomainError> {
        let storage_key = key.storage_key();
        debug!(key = %storage_key, "Loading entity with raw bytes");

        match self.backend.get(&storage_key).await? {
            Some(bytes) => Ok(Some((serde_json::from_slice(&bytes)?, bytes))),
            None => Ok(None),
        }
    }

    /// Writes the entity unconditionally, last writer wins
    pub async fn put(&self, entity: &E) -> Result<(), DomainError> {
        let storage_key = Self::checked_key(entity)?;
        let bytes = serde_json::to_vec(entity)?;

        debug!(key = %storage_key, "Storing entity");
        self.backend.put(&storage_key, bytes).await
    }

    /// Writes the entity only if nothing is stored under its key yet
    pub async fn put_if_absent(&self, entity: &E) -> Result<bool, DomainError> {
        let storage_key = Self::checked_key(entity)?;
        let bytes = serde_json::to_vec(entity)?;

        debug!(key = %storage_key, "Storing entity if absent");
        self.backend.put_if_absent(&storage_key, bytes).await
    }

    /// Writes the entity only if its key still holds `expected`, as read by `find_raw`
    pub async fn replace(&self, entity: &E, expected: Vec<u8>) -> Result<bool, DomainError> {
        let storage_key = Self::checked_key(entity)?;
        let bytes = serde_json::to_vec(entity)?;

        debug!(key = %storage_key, "Replacing entity");
        self.backend
            .compare_and_swap(&storage_key, expected, bytes)
            .await
    }

    /// Deletes the entity, failing with `NotFound` when absent
    pub async fn delete(&self, key: &E::Key) -> Result<(), DomainError> {
        let storage_key = key.storage_key();
        debug!(key = %storage_key, "Deleting entity");

        if self.backend.delete(&storage_key).await? {
            Ok(())
        } else {
            Err(DomainError::not_found(format!("{} not found", key)))
        }
    }

    /// Removes the entry without treating absence as an error
    pub async fn remove(&self, key: &E::Key) -> Result<bool, DomainError> {
        self.backend.delete(&key.storage_key()).await
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    fn checked_key(entity: &E) -> Result<String, DomainError> {
        let storage_key = entity.key().storage_key();
        validate_storage_key(&storage_key)?;

        if storage_key.contains("//") {
            warn!(key = %storage_key, "Storing entity with an empty name");
        }
        Ok(storage_key)
    }
}
