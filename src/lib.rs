//! Config Registry
//!
//! A versioned configuration registry:
//! - Configs and config groups addressed by name and version
//! - Label-based queries and bulk deletes over group members
//! - Idempotent mutations and token-bucket admission control
//! - Pluggable key-value backends (in-memory, Consul, Redis)

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::KeyValueStore;
use infrastructure::rate_limit::{RateLimitConfig, TokenBucket};
use infrastructure::services::CreatePolicy;
use infrastructure::storage::StorageFactory;
use tracing::info;

/// Create the application state with the in-memory backend and default settings
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config.storage.storage_config()?;
    info!(storage_type = ?storage_config.storage_type(), "Initializing storage backend");

    let store = StorageFactory::create(&storage_config).await?;

    Ok(create_app_state_with_store(store, config))
}

/// Create the application state on an already constructed backend
pub fn create_app_state_with_store(store: Arc<dyn KeyValueStore>, config: &AppConfig) -> AppState {
    let rate_limit = RateLimitConfig::from(&config.rate_limit);
    if !rate_limit.enabled {
        info!("Rate limiting disabled");
    }

    AppState::new(
        store,
        Arc::new(TokenBucket::new(rate_limit)),
        CreatePolicy::from_strict(config.registry.strict_create),
    )
    .with_idempotency_timeout(chrono::Duration::seconds(
        config.registry.idempotency_pending_timeout_secs,
    ))
}
