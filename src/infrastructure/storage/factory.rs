//! Storage factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::domain::storage::KeyValueStore;
use crate::domain::DomainError;

use super::consul::{ConsulConfig, ConsulKeyValueStore};
use super::in_memory::InMemoryKeyValueStore;
use super::redis::{RedisConfig, RedisKeyValueStore};

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// Consul KV over HTTP
    Consul,
    /// Redis strings
    Redis,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "consul" => Some(Self::Consul),
            "redis" => Some(Self::Redis),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory,
    Consul(ConsulConfig),
    Redis(RedisConfig),
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    pub fn consul(config: ConsulConfig) -> Self {
        Self::Consul(config)
    }

    pub fn redis(config: RedisConfig) -> Self {
        Self::Redis(config)
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Consul(_) => StorageType::Consul,
            Self::Redis(_) => StorageType::Redis,
        }
    }
}

/// Factory for creating key-value store instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates a key-value store based on the configuration
    pub async fn create(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, DomainError> {
        let store: Arc<dyn KeyValueStore> = match config {
            StorageConfig::InMemory => Arc::new(InMemoryKeyValueStore::new()),
            StorageConfig::Consul(consul) => {
                info!(address = %consul.address(), "Using Consul KV storage");
                Arc::new(ConsulKeyValueStore::new(consul.clone())?)
            }
            StorageConfig::Redis(redis) => {
                info!(url = %redis.url, "Using Redis storage");
                Arc::new(RedisKeyValueStore::connect(redis.clone()).await?)
            }
        };

        Ok(store)
    }

    /// Creates an in-memory store
    pub fn create_in_memory() -> Arc<InMemoryKeyValueStore> {
        Arc::new(InMemoryKeyValueStore::new())
    }
}
