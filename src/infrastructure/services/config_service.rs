//! Config service - create, read and delete whole configs

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::storage::StorageEntity;
use crate::domain::{Config, DomainError, EntityKey, KeyValueStore, Version};
use crate::infrastructure::storage::EntityStore;

/// How creating an entity treats an existing identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreatePolicy {
    /// Replace whatever is stored under the identity
    #[default]
    Upsert,
    /// Fail with `Conflict` when the identity already exists
    CreateOnly,
}

impl CreatePolicy {
    pub fn from_strict(strict_create: bool) -> Self {
        if strict_create {
            Self::CreateOnly
        } else {
            Self::Upsert
        }
    }
}

/// Service for standalone configs
#[derive(Debug, Clone)]
pub struct ConfigService {
    store: EntityStore<Config>,
    policy: CreatePolicy,
}

impl ConfigService {
    pub fn new(backend: Arc<dyn KeyValueStore>, policy: CreatePolicy) -> Self {
        Self {
            store: EntityStore::new(backend),
            policy,
        }
    }

    /// Stores a config under its `(name, version)` identity
    pub async fn create(&self, config: Config) -> Result<Config, DomainError> {
        let key = config.key();
        debug!(config = %key, policy = ?self.policy, "Creating config");

        match self.policy {
            CreatePolicy::Upsert => self.store.put(&config).await?,
            CreatePolicy::CreateOnly => {
                if !self.store.put_if_absent(&config).await? {
                    return Err(DomainError::conflict(format!("{} already exists", key)));
                }
            }
        }

        info!(config = %key, "Config stored");
        Ok(config)
    }

    pub async fn get(&self, name: &str, version: Version) -> Result<Config, DomainError> {
        self.store.get(&EntityKey::config(name, version)).await
    }

    pub async fn delete(&self, name: &str, version: Version) -> Result<(), DomainError> {
        let key = EntityKey::config(name, version);
        self.store.delete(&key).await?;

        info!(config = %key, "Config deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Parameters;
    use crate::infrastructure::storage::InMemoryKeyValueStore;

    fn service(policy: CreatePolicy) -> ConfigService {
        ConfigService::new(Arc::new(InMemoryKeyValueStore::new()), policy)
    }

    fn config(host: &str) -> Config {
        let mut parameters = Parameters::new();
        parameters.insert("host".to_string(), host.to_string());
        Config::new("db", Version::from_tenths(10), parameters)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = service(CreatePolicy::Upsert);

        service.create(config("a")).await.unwrap();

        let loaded = service.get("db", Version::from_tenths(10)).await.unwrap();
        assert_eq!(loaded, config("a"));
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing() {
        let service = service(CreatePolicy::Upsert);

        service.create(config("a")).await.unwrap();
        service.create(config("b")).await.unwrap();

        let loaded = service.get("db", Version::from_tenths(10)).await.unwrap();
        assert_eq!(loaded.parameters["host"], "b");
    }

    #[tokio::test]
    async fn test_create_only_conflicts() {
        let service = service(CreatePolicy::CreateOnly);

        service.create(config("a")).await.unwrap();
        let result = service.create(config("b")).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        let loaded = service.get("db", Version::from_tenths(10)).await.unwrap();
        assert_eq!(loaded.parameters["host"], "a");
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let service = service(CreatePolicy::Upsert);
        service.create(config("a")).await.unwrap();

        service.delete("db", Version::from_tenths(10)).await.unwrap();

        let result = service.get("db", Version::from_tenths(10)).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        let again = service.delete("db", Version::from_tenths(10)).await;
        assert!(matches!(again, Err(DomainError::NotFound { .. })));
    }

    #[test]
    fn test_policy_from_strict_flag() {
        assert_eq!(CreatePolicy::from_strict(false), CreatePolicy::Upsert);
        assert_eq!(CreatePolicy::from_strict(true), CreatePolicy::CreateOnly);
    }
}
