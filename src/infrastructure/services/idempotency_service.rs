//! Idempotency guard - remembers which request keys were already handled

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use crate::domain::{
    DomainError, IdempotencyKey, IdempotencyRecord, KeyValueStore, Reservation,
};
use crate::infrastructure::storage::EntityStore;

/// Default age after which an unfinished reservation may be taken over
pub const DEFAULT_PENDING_TIMEOUT_SECS: i64 = 60;

/// Check/record guard with atomic reservations
///
/// `check`/`record` give the plain contract: check before mutating, record after success.
/// `reserve`/`complete`/`release` close the gap between the two so concurrent retries with
/// one key cannot both run.
#[derive(Debug, Clone)]
pub struct IdempotencyService {
    store: EntityStore<IdempotencyRecord>,
    pending_timeout: Duration,
}

impl IdempotencyService {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: EntityStore::new(backend),
            pending_timeout: Duration::seconds(DEFAULT_PENDING_TIMEOUT_SECS),
        }
    }

    pub fn with_pending_timeout(mut self, timeout: Duration) -> Self {
        self.pending_timeout = timeout;
        self
    }

    /// Returns true once a request with this key completed
    pub async fn check(&self, key: &IdempotencyKey) -> Result<bool, DomainError> {
        Ok(self
            .store
            .find(key)
            .await?
            .is_some_and(|record| record.is_completed()))
    }

    /// Marks the key as completed
    pub async fn record(&self, key: &IdempotencyKey) -> Result<(), DomainError> {
        debug!(key = %key.as_str(), "Recording idempotency key");
        self.store.put(&IdempotencyRecord::completed(key.clone())).await
    }

    /// Claims the key for the calling request
    pub async fn reserve(&self, key: &IdempotencyKey) -> Result<Reservation, DomainError> {
        if self
            .store
            .put_if_absent(&IdempotencyRecord::pending(key.clone()))
            .await?
        {
            debug!(key = %key.as_str(), "Idempotency key reserved");
            return Ok(Reservation::Reserved);
        }

        let Some((existing, raw)) = self.store.find_raw(key).await? else {
            // Released between the two calls; try once more
            return Ok(
                if self
                    .store
                    .put_if_absent(&IdempotencyRecord::pending(key.clone()))
                    .await?
                {
                    Reservation::Reserved
                } else {
                    Reservation::InFlight
                },
            );
        };

        if existing.is_completed() {
            return Ok(Reservation::AlreadyCompleted);
        }

        if existing.is_stale_at(Utc::now(), self.pending_timeout) {
            // Only the caller whose swap lands on the stale bytes owns the key
            let taken = self
                .store
                .replace(&IdempotencyRecord::pending(key.clone()), raw)
                .await?;

            if taken {
                warn!(
                    key = %key.as_str(),
                    created_at = %existing.created_at,
                    "Took over stale idempotency reservation"
                );
                return Ok(Reservation::Reserved);
            }

            debug!(key = %key.as_str(), "Stale reservation was taken over by another request");
            return Ok(Reservation::InFlight);
        }

        Ok(Reservation::InFlight)
    }

    /// Finishes a reservation after the request succeeded
    pub async fn complete(&self, key: &IdempotencyKey) -> Result<(), DomainError> {
        self.record(key).await
    }

    /// Drops a reservation so the request can be retried
    pub async fn release(&self, key: &IdempotencyKey) -> Result<(), DomainError> {
        debug!(key = %key.as_str(), "Releasing idempotency key");
        self.store.remove(key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::domain::storage::StorageKey;
    use crate::domain::IdempotencyStatus;
    use crate::infrastructure::storage::InMemoryKeyValueStore;

    fn service() -> IdempotencyService {
        IdempotencyService::new(Arc::new(InMemoryKeyValueStore::new()))
    }

    /// Yields to the scheduler before every backend call so concurrent callers interleave
    #[derive(Debug, Default)]
    struct YieldingStore {
        inner: InMemoryKeyValueStore,
    }

    #[async_trait]
    impl KeyValueStore for YieldingStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError> {
            tokio::task::yield_now().await;
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), DomainError> {
            tokio::task::yield_now().await;
            self.inner.put(key, value).await
        }

        async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool, DomainError> {
            tokio::task::yield_now().await;
            self.inner.put_if_absent(key, value).await
        }

        async fn compare_and_swap(
            &self,
            key: &str,
            expected: Vec<u8>,
            value: Vec<u8>,
        ) -> Result<bool, DomainError> {
            tokio::task::yield_now().await;
            self.inner.compare_and_swap(key, expected, value).await
        }

        async fn delete(&self, key: &str) -> Result<bool, DomainError> {
            tokio::task::yield_now().await;
            self.inner.delete(key).await
        }

        fn backend_name(&self) -> &'static str {
            "yielding"
        }
    }

    #[tokio::test]
    async fn test_check_before_and_after_record() {
        let service = service();
        let key = IdempotencyKey::new("k1");

        assert!(!service.check(&key).await.unwrap());
        service.record(&key).await.unwrap();
        assert!(service.check(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_record_uses_dedicated_namespace() {
        let backend = Arc::new(InMemoryKeyValueStore::new());
        let service = IdempotencyService::new(backend.clone());
        let key = IdempotencyKey::new("k1");

        service.record(&key).await.unwrap();

        let bytes = backend.get(&key.storage_key()).await.unwrap().unwrap();
        let record: IdempotencyRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(key.storage_key(), "idempotency_requests/k1/");
        assert_eq!(record.status, IdempotencyStatus::Completed);
    }

    #[tokio::test]
    async fn test_reserve_lifecycle() {
        let service = service();
        let key = IdempotencyKey::new("k1");

        assert_eq!(service.reserve(&key).await.unwrap(), Reservation::Reserved);
        assert_eq!(service.reserve(&key).await.unwrap(), Reservation::InFlight);
        assert!(!service.check(&key).await.unwrap());

        service.complete(&key).await.unwrap();

        assert_eq!(
            service.reserve(&key).await.unwrap(),
            Reservation::AlreadyCompleted
        );
        assert!(service.check(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_allows_retry() {
        let service = service();
        let key = IdempotencyKey::new("k1");

        service.reserve(&key).await.unwrap();
        service.release(&key).await.unwrap();

        assert_eq!(service.reserve(&key).await.unwrap(), Reservation::Reserved);
    }

    #[tokio::test]
    async fn test_stale_reservation_is_taken_over() {
        let service = service().with_pending_timeout(Duration::zero());
        let key = IdempotencyKey::new("k1");

        assert_eq!(service.reserve(&key).await.unwrap(), Reservation::Reserved);
        assert_eq!(service.reserve(&key).await.unwrap(), Reservation::Reserved);
    }

    #[tokio::test]
    async fn test_concurrent_reserve_has_single_winner() {
        let service = service();

        let attempts = (0..16).map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.reserve(&IdempotencyKey::new("k1")).await })
        });

        let outcomes: Vec<Reservation> = futures::future::join_all(attempts)
            .await
            .into_iter()
            .map(|result| result.unwrap().unwrap())
            .collect();

        let reserved = outcomes
            .iter()
            .filter(|outcome| **outcome == Reservation::Reserved)
            .count();
        assert_eq!(reserved, 1);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, Reservation::Reserved | Reservation::InFlight)));
    }

    #[tokio::test]
    async fn test_concurrent_takeover_of_stale_reservation_has_single_winner() {
        let backend = Arc::new(YieldingStore::default());
        let key = IdempotencyKey::new("k1");
        let abandoned = IdempotencyRecord {
            key: key.clone(),
            status: IdempotencyStatus::Pending,
            created_at: Utc::now() - Duration::seconds(600),
        };
        backend
            .put(&key.storage_key(), serde_json::to_vec(&abandoned).unwrap())
            .await
            .unwrap();

        let service = IdempotencyService::new(backend);
        let attempts = (0..8).map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.reserve(&IdempotencyKey::new("k1")).await })
        });

        let outcomes: Vec<Reservation> = futures::future::join_all(attempts)
            .await
            .into_iter()
            .map(|result| result.unwrap().unwrap())
            .collect();

        let reserved = outcomes
            .iter()
            .filter(|outcome| **outcome == Reservation::Reserved)
            .count();
        assert_eq!(reserved, 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|outcome| **outcome == Reservation::InFlight)
                .count(),
            7
        );
    }

    #[tokio::test]
    async fn test_relative_key_is_rejected() {
        let service = service();

        let result = service.reserve(&IdempotencyKey::new("..")).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }
}
