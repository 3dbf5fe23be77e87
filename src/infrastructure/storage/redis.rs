//! Redis key-value store implementation

use std::fmt;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};

use crate::domain::storage::KeyValueStore;
use crate::domain::DomainError;

/// Replaces `KEYS[1]` with `ARGV[2]` only while it still holds `ARGV[1]`
const COMPARE_AND_SWAP_SCRIPT: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    redis.call('SET', KEYS[1], ARGV[2])
    return 1
end
return 0
";

/// Configuration for the Redis backend
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
        }
    }
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

/// Key-value store backed by Redis strings
///
/// Connection pooling and reconnects are handled by `ConnectionManager`.
#[derive(Clone)]
pub struct RedisKeyValueStore {
    connection: ConnectionManager,
    config: RedisConfig,
}

impl fmt::Debug for RedisKeyValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisKeyValueStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisKeyValueStore {
    pub async fn connect(config: RedisConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str()).map_err(|e| {
            DomainError::configuration(format!("Failed to create Redis client: {}", e))
        })?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError> {
        let mut conn = self.connection.clone();

        conn.get(self.config.prefix_key(key))
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get key '{}': {}", key, e)))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        conn.set::<_, _, ()>(self.config.prefix_key(key), value)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to set key '{}': {}", key, e)))
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        conn.set_nx(self.config.prefix_key(key), value)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to set_nx key '{}': {}", key, e)))
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Vec<u8>,
        value: Vec<u8>,
    ) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let swapped: i64 = Script::new(COMPARE_AND_SWAP_SCRIPT)
            .key(self.config.prefix_key(key))
            .arg(expected)
            .arg(value)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to swap key '{}': {}", key, e))
            })?;

        Ok(swapped == 1)
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let deleted: i64 = conn.del(self.config.prefix_key(key)).await.map_err(|e| {
            DomainError::storage(format!("Failed to delete key '{}': {}", key, e))
        })?;

        Ok(deleted > 0)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
