//! Config group service - create, read and delete whole groups

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::storage::StorageEntity;
use crate::domain::{ConfigGroup, DomainError, EntityKey, KeyValueStore, Version};
use crate::infrastructure::storage::EntityStore;

use super::config_service::CreatePolicy;
use super::group_locks::GroupLocks;

/// Service for whole config groups
///
/// Replacing or deleting a group takes the same per-group lock as membership changes, so
/// a replace can never interleave with an add or remove.
#[derive(Debug, Clone)]
pub struct ConfigGroupService {
    store: EntityStore<ConfigGroup>,
    locks: Arc<GroupLocks>,
    policy: CreatePolicy,
}

impl ConfigGroupService {
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        locks: Arc<GroupLocks>,
        policy: CreatePolicy,
    ) -> Self {
        Self {
            store: EntityStore::new(backend),
            locks,
            policy,
        }
    }

    pub async fn create(&self, group: ConfigGroup) -> Result<ConfigGroup, DomainError> {
        let key = group.key();
        debug!(
            group = %key,
            members = group.configurations.len(),
            policy = ?self.policy,
            "Creating config group"
        );

        let _guard = self.locks.lock(&key).await;
        match self.policy {
            CreatePolicy::Upsert => self.store.put(&group).await?,
            CreatePolicy::CreateOnly => {
                if !self.store.put_if_absent(&group).await? {
                    return Err(DomainError::conflict(format!("{} already exists", key)));
                }
            }
        }

        info!(group = %key, "Config group stored");
        Ok(group)
    }

    pub async fn get(&self, name: &str, version: Version) -> Result<ConfigGroup, DomainError> {
        self.store.get(&EntityKey::config_group(name, version)).await
    }

    pub async fn delete(&self, name: &str, version: Version) -> Result<(), DomainError> {
        let key = EntityKey::config_group(name, version);

        let _guard = self.locks.lock(&key).await;
        self.store.delete(&key).await?;

        info!(group = %key, "Config group deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfigForGroup, Labels, Parameters};
    use crate::infrastructure::storage::InMemoryKeyValueStore;

    fn service(policy: CreatePolicy) -> ConfigGroupService {
        ConfigGroupService::new(
            Arc::new(InMemoryKeyValueStore::new()),
            Arc::new(GroupLocks::new()),
            policy,
        )
    }

    fn group(members: &[&str]) -> ConfigGroup {
        let configurations = members
            .iter()
            .map(|name| ConfigForGroup::new(*name, Labels::new(), Parameters::new()))
            .collect();
        ConfigGroup::new("web", Version::from_tenths(10), configurations)
    }

    #[tokio::test]
    async fn test_create_and_get_preserves_member_order() {
        let service = service(CreatePolicy::Upsert);

        service.create(group(&["c", "a", "b"])).await.unwrap();

        let loaded = service.get("web", Version::from_tenths(10)).await.unwrap();
        let names: Vec<_> = loaded.configurations.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_group_round_trips() {
        let service = service(CreatePolicy::Upsert);

        service.create(group(&[])).await.unwrap();

        let loaded = service.get("web", Version::from_tenths(10)).await.unwrap();
        assert_eq!(loaded, group(&[]));
    }

    #[tokio::test]
    async fn test_create_only_conflicts() {
        let service = service(CreatePolicy::CreateOnly);

        service.create(group(&["a"])).await.unwrap();
        let result = service.create(group(&["b"])).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_delete_missing_group() {
        let service = service(CreatePolicy::Upsert);

        let result = service.delete("web", Version::from_tenths(10)).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
