//! Idempotency domain - markers for already handled requests

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::registry::IdempotencyKey;
use crate::domain::storage::StorageEntity;

/// Lifecycle of a request carrying an idempotency key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdempotencyStatus {
    /// The request is being handled right now
    Pending,
    /// The request finished successfully
    Completed,
}

/// Persisted marker for an idempotency key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub key: IdempotencyKey,
    pub status: IdempotencyStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    pub fn pending(key: IdempotencyKey) -> Self {
        Self {
            key,
            status: IdempotencyStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn completed(key: IdempotencyKey) -> Self {
        Self {
            key,
            status: IdempotencyStatus::Completed,
            created_at: Utc::now(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == IdempotencyStatus::Completed
    }

    /// A pending marker older than `timeout` belongs to a request that never finished
    pub fn is_stale_at(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        self.status == IdempotencyStatus::Pending && now - self.created_at >= timeout
    }
}

impl StorageEntity for IdempotencyRecord {
    type Key = IdempotencyKey;

    fn key(&self) -> Self::Key {
        self.key.clone()
    }
}

/// Outcome of trying to reserve an idempotency key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// The caller owns the key and must complete or release it
    Reserved,
    /// A previous request with this key already succeeded
    AlreadyCompleted,
    /// Another request with this key is still running
    InFlight,
}
