//! Group membership engine - add, remove and query members of a config group

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::registry::labels;
use crate::domain::{
    ConfigForGroup, ConfigGroup, DomainError, EntityKey, KeyValueStore, Labels, Version,
};
use crate::infrastructure::storage::EntityStore;

use super::group_locks::GroupLocks;

/// Mutates the member list of existing config groups
///
/// Every mutation loads the group, changes it in memory and stores it back while holding
/// the group's lock. Groups are never created implicitly.
#[derive(Debug, Clone)]
pub struct MembershipService {
    store: EntityStore<ConfigGroup>,
    locks: Arc<GroupLocks>,
}

impl MembershipService {
    pub fn new(backend: Arc<dyn KeyValueStore>, locks: Arc<GroupLocks>) -> Self {
        Self {
            store: EntityStore::new(backend),
            locks,
        }
    }

    /// Appends a member at the tail of the group
    pub async fn add_member(
        &self,
        group_name: &str,
        group_version: Version,
        member: ConfigForGroup,
    ) -> Result<(), DomainError> {
        let key = EntityKey::config_group(group_name, group_version);
        let _guard = self.locks.lock(&key).await;

        let mut group = self.store.get(&key).await?;
        debug!(group = %key, member = %member.name, "Adding member");

        group.push_member(member);
        self.store.put(&group).await?;

        info!(group = %key, members = group.configurations.len(), "Member added");
        Ok(())
    }

    /// Removes the first member named `member_name` and returns it
    pub async fn remove_member(
        &self,
        group_name: &str,
        group_version: Version,
        member_name: &str,
    ) -> Result<ConfigForGroup, DomainError> {
        let key = EntityKey::config_group(group_name, group_version);
        let _guard = self.locks.lock(&key).await;

        let mut group = self.store.get(&key).await?;

        let removed = group.remove_first_named(member_name).ok_or_else(|| {
            DomainError::member_not_found(format!(
                "Member '{}' not found in {}",
                member_name, key
            ))
        })?;
        self.store.put(&group).await?;

        info!(group = %key, member = %member_name, "Member removed");
        Ok(removed)
    }

    /// Returns the members whose labels contain `query`, in group order
    pub async fn query_by_labels(
        &self,
        group_name: &str,
        group_version: Version,
        query: &Labels,
    ) -> Result<Vec<ConfigForGroup>, DomainError> {
        let key = EntityKey::config_group(group_name, group_version);
        let group = self.store.get(&key).await?;

        let members = group.members_matching(query);
        debug!(
            group = %key,
            selector = %labels::format_selector(query),
            matched = members.len(),
            "Queried members by labels"
        );

        Ok(members)
    }

    /// Removes every member whose labels contain `query` and returns how many went
    pub async fn delete_by_labels(
        &self,
        group_name: &str,
        group_version: Version,
        query: &Labels,
    ) -> Result<usize, DomainError> {
        let key = EntityKey::config_group(group_name, group_version);
        let _guard = self.locks.lock(&key).await;

        let mut group = self.store.get(&key).await?;

        let removed = group.remove_matching(query);
        if removed == 0 {
            return Err(DomainError::no_match(format!(
                "No members of {} match labels '{}'",
                key,
                labels::format_selector(query)
            )));
        }
        self.store.put(&group).await?;

        info!(
            group = %key,
            selector = %labels::format_selector(query),
            removed,
            "Members removed by labels"
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::MockKeyValueStore;
    use crate::domain::Parameters;
    use crate::infrastructure::storage::InMemoryKeyValueStore;

    struct Fixture {
        backend: Arc<InMemoryKeyValueStore>,
        groups: EntityStore<ConfigGroup>,
        service: MembershipService,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(InMemoryKeyValueStore::new());
        let shared: Arc<dyn KeyValueStore> = backend.clone();
        Fixture {
            backend,
            groups: EntityStore::new(Arc::clone(&shared)),
            service: MembershipService::new(shared, Arc::new(GroupLocks::new())),
        }
    }

    fn v1() -> Version {
        Version::from_tenths(10)
    }

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn member(name: &str, pairs: &[(&str, &str)]) -> ConfigForGroup {
        ConfigForGroup::new(name, labels(pairs), Parameters::new())
    }

    async fn seed(fixture: &Fixture, members: Vec<ConfigForGroup>) {
        fixture
            .groups
            .put(&ConfigGroup::new("web", v1(), members))
            .await
            .unwrap();
    }

    async fn member_names(fixture: &Fixture) -> Vec<String> {
        fixture
            .groups
            .get(&EntityKey::config_group("web", v1()))
            .await
            .unwrap()
            .configurations
            .into_iter()
            .map(|m| m.name)
            .collect()
    }

    #[tokio::test]
    async fn test_query_by_labels_scenario() {
        let fixture = fixture();
        seed(&fixture, vec![member("db", &[("env", "prod")])]).await;

        let prod = fixture
            .service
            .query_by_labels("web", v1(), &labels(&[("env", "prod")]))
            .await
            .unwrap();
        assert_eq!(prod, vec![member("db", &[("env", "prod")])]);

        let staging = fixture
            .service
            .query_by_labels("web", v1(), &labels(&[("env", "staging")]))
            .await
            .unwrap();
        assert!(staging.is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_member_leaves_group_unchanged() {
        let fixture = fixture();
        seed(&fixture, vec![member("db", &[]), member("cache", &[])]).await;

        let result = fixture.service.remove_member("web", v1(), "missing").await;

        assert!(matches!(result, Err(DomainError::MemberNotFound { .. })));
        assert_eq!(member_names(&fixture).await, vec!["db", "cache"]);
    }

    #[tokio::test]
    async fn test_remove_member_first_match_only() {
        let fixture = fixture();
        seed(
            &fixture,
            vec![
                member("a", &[]),
                member("dup", &[("n", "1")]),
                member("b", &[]),
                member("dup", &[("n", "2")]),
            ],
        )
        .await;

        let removed = fixture.service.remove_member("web", v1(), "dup").await.unwrap();

        assert_eq!(removed.labels, labels(&[("n", "1")]));
        assert_eq!(member_names(&fixture).await, vec!["a", "b", "dup"]);
    }

    #[tokio::test]
    async fn test_add_member_appends_at_tail_once() {
        let fixture = fixture();
        seed(&fixture, vec![member("a", &[("env", "prod")])]).await;

        fixture
            .service
            .add_member("web", v1(), member("b", &[("env", "prod"), ("tier", "db")]))
            .await
            .unwrap();

        assert_eq!(member_names(&fixture).await, vec!["a", "b"]);
        let found = fixture
            .service
            .query_by_labels("web", v1(), &labels(&[("tier", "db")]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "b");
    }

    #[tokio::test]
    async fn test_add_member_to_missing_group() {
        let fixture = fixture();

        let result = fixture.service.add_member("web", v1(), member("a", &[])).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        assert!(fixture.backend.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_labels_counts_and_preserves_order() {
        let fixture = fixture();
        seed(
            &fixture,
            vec![
                member("a", &[("env", "prod")]),
                member("b", &[("env", "dev")]),
                member("c", &[("env", "prod"), ("tier", "db")]),
                member("d", &[("env", "dev")]),
            ],
        )
        .await;
        let query = labels(&[("env", "prod")]);

        let removed = fixture.service.delete_by_labels("web", v1(), &query).await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(member_names(&fixture).await, vec!["b", "d"]);
        let remaining = fixture.service.query_by_labels("web", v1(), &query).await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_labels_without_match_does_not_write() {
        let mut backend = MockKeyValueStore::new();
        let group = ConfigGroup::new("web", v1(), vec![member("a", &[("env", "dev")])]);
        let bytes = serde_json::to_vec(&group).unwrap();
        backend
            .expect_get()
            .returning(move |_| Ok(Some(bytes.clone())));
        backend.expect_put().never();

        let service = MembershipService::new(Arc::new(backend), Arc::new(GroupLocks::new()));
        let result = service
            .delete_by_labels("web", v1(), &labels(&[("env", "prod")]))
            .await;

        assert!(matches!(result, Err(DomainError::NoMatch { .. })));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let mut backend = MockKeyValueStore::new();
        let group = ConfigGroup::new("web", v1(), vec![]);
        let bytes = serde_json::to_vec(&group).unwrap();
        backend
            .expect_get()
            .returning(move |_| Ok(Some(bytes.clone())));
        backend
            .expect_put()
            .returning(|_, _| Err(DomainError::storage("write failed")));

        let service = MembershipService::new(Arc::new(backend), Arc::new(GroupLocks::new()));
        let result = service.add_member("web", v1(), member("a", &[])).await;

        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_adds_keep_every_member() {
        let fixture = fixture();
        seed(&fixture, vec![]).await;

        let adds = (0..32).map(|i| {
            let service = fixture.service.clone();
            tokio::spawn(async move {
                service
                    .add_member("web", v1(), member(&format!("m{}", i), &[]))
                    .await
            })
        });

        for result in futures::future::join_all(adds).await {
            result.unwrap().unwrap();
        }

        let mut names = member_names(&fixture).await;
        names.sort();
        let mut expected: Vec<_> = (0..32).map(|i| format!("m{}", i)).collect();
        expected.sort();
        assert_eq!(names, expected);
    }
}
