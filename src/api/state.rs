//! Application state for shared services

use std::sync::Arc;

use crate::domain::KeyValueStore;
use crate::infrastructure::rate_limit::TokenBucket;
use crate::infrastructure::services::{
    ConfigGroupService, ConfigService, CreatePolicy, GroupLocks, IdempotencyService,
    MembershipService,
};

/// Application state shared by every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config_service: Arc<ConfigService>,
    pub config_group_service: Arc<ConfigGroupService>,
    pub membership_service: Arc<MembershipService>,
    pub idempotency_service: Arc<IdempotencyService>,
    pub rate_limiter: Arc<TokenBucket>,
    pub store: Arc<dyn KeyValueStore>,
}

impl AppState {
    /// Wires every service onto one key-value backend
    ///
    /// Group replace and membership changes share a single lock table.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        rate_limiter: Arc<TokenBucket>,
        policy: CreatePolicy,
    ) -> Self {
        let locks = Arc::new(GroupLocks::new());

        Self {
            config_service: Arc::new(ConfigService::new(Arc::clone(&store), policy)),
            config_group_service: Arc::new(ConfigGroupService::new(
                Arc::clone(&store),
                Arc::clone(&locks),
                policy,
            )),
            membership_service: Arc::new(MembershipService::new(Arc::clone(&store), locks)),
            idempotency_service: Arc::new(IdempotencyService::new(Arc::clone(&store))),
            rate_limiter,
            store,
        }
    }

    /// Replaces the age after which an unfinished idempotency reservation may be taken over
    pub fn with_idempotency_timeout(mut self, timeout: chrono::Duration) -> Self {
        self.idempotency_service = Arc::new(
            IdempotencyService::new(Arc::clone(&self.store)).with_pending_timeout(timeout),
        );
        self
    }
}
