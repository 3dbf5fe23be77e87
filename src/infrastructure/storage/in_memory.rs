//! In-memory key-value store implementation

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::storage::KeyValueStore;
use crate::domain::DomainError;

/// Thread-safe in-memory key-value store
///
/// Useful for testing and development. Data is lost when the process terminates.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryKeyValueStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError> {
        let entries = self.entries.read().map_err(|e| {
            DomainError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), DomainError> {
        let mut entries = self.entries.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool, DomainError> {
        let mut entries = self.entries.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if entries.contains_key(key) {
            return Ok(false);
        }

        entries.insert(key.to_string(), value);
        Ok(true)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Vec<u8>,
        value: Vec<u8>,
    ) -> Result<bool, DomainError> {
        let mut entries = self.entries.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        match entries.get_mut(key) {
            Some(current) if *current == expected => {
                *current = value;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let mut entries = self.entries.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(entries.remove(key).is_some())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = InMemoryKeyValueStore::new();

        store.put("configs/db/v1.0", b"{}".to_vec()).await.unwrap();

        let value = store.get("configs/db/v1.0").await.unwrap();
        assert_eq!(value, Some(b"{}".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = InMemoryKeyValueStore::new();

        store.put("k", b"first".to_vec()).await.unwrap();
        store.put("k", b"second".to_vec()).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(b"second".to_vec()));
    }

    #[tokio::test]
    async fn test_put_if_absent() {
        let store = InMemoryKeyValueStore::new();

        assert!(store.put_if_absent("k", b"first".to_vec()).await.unwrap());
        assert!(!store.put_if_absent("k", b"second".to_vec()).await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some(b"first".to_vec()));
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let store = InMemoryKeyValueStore::new();
        store.put("k", b"first".to_vec()).await.unwrap();

        assert!(!store
            .compare_and_swap("k", b"stale".to_vec(), b"second".to_vec())
            .await
            .unwrap());
        assert!(store
            .compare_and_swap("k", b"first".to_vec(), b"second".to_vec())
            .await
            .unwrap());
        assert!(!store
            .compare_and_swap("k", b"first".to_vec(), b"third".to_vec())
            .await
            .unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some(b"second".to_vec()));
    }

    #[tokio::test]
    async fn test_compare_and_swap_missing_key() {
        let store = InMemoryKeyValueStore::new();

        assert!(!store
            .compare_and_swap("k", b"first".to_vec(), b"second".to_vec())
            .await
            .unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryKeyValueStore::new();

        store.put("k", b"v".to_vec()).await.unwrap();

        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
        assert!(store.is_empty());
    }
}
