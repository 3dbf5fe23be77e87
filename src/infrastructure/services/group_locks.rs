//! Per-group mutual exclusion for read-modify-write cycles

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::EntityKey;

/// Keyed async lock table
///
/// Holding the guard for a group serializes every load-mutate-store cycle on that group
/// within this process. Idle entries are pruned on the next acquisition.
#[derive(Debug, Default)]
pub struct GroupLocks {
    locks: Mutex<HashMap<EntityKey, Arc<AsyncMutex<()>>>>,
}

impl GroupLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the lock for `key` is free and returns its guard
    pub async fn lock(&self, key: &EntityKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());

            // The table itself holds one reference; anything more is a holder or waiter
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);

            Arc::clone(
                locks
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };

        lock.lock_owned().await
    }

    /// Number of tracked keys, idle or not
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}
