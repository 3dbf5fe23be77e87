//! Storage entity traits

use std::fmt::{Debug, Display};

use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// Trait for identities that address a record in the key-value store
pub trait StorageKey: Clone + Debug + Display + Send + Sync + Eq + std::hash::Hash {
    /// Returns the string key used by the key-value backend
    fn storage_key(&self) -> String;
}

/// Trait for types that can be persisted through an entity store
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    /// The identity type for this entity
    type Key: StorageKey;

    /// Returns the entity's identity
    fn key(&self) -> Self::Key;
}

/// Rejects keys containing `.` or `..` segments
///
/// Path-addressed backends resolve those segments, so `configs/a/../v1.0` would land on
/// the same record as `configs/v1.0`.
pub fn validate_storage_key(key: &str) -> Result<(), DomainError> {
    if key.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(DomainError::validation(format!(
            "Key '{}' must not contain '.' or '..' segments",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct TestKey(String);

    impl StorageKey for TestKey {
        fn storage_key(&self) -> String {
            format!("tests/{}", self.0)
        }
    }

    impl std::fmt::Display for TestKey {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test '{}'", self.0)
        }
    }

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    struct TestEntity {
        id: String,
        name: String,
    }

    impl StorageEntity for TestEntity {
        type Key = TestKey;

        fn key(&self) -> Self::Key {
            TestKey(self.id.clone())
        }
    }

    #[test]
    fn test_storage_key_is_namespaced() {
        let key = TestKey("test-key".to_string());
        assert_eq!(key.storage_key(), "tests/test-key");
    }

    #[test]
    fn test_storage_entity_key() {
        let entity = TestEntity {
            id: "entity-1".to_string(),
            name: "Test".to_string(),
        };
        assert_eq!(entity.key().storage_key(), "tests/entity-1");
        assert_eq!(entity.key().to_string(), "test 'entity-1'");
    }

    #[test]
    fn test_relative_segments_are_rejected() {
        assert!(validate_storage_key("configs/a/../v1.0").is_err());
        assert!(validate_storage_key("configs/./v1.0").is_err());
        assert!(validate_storage_key("idempotency_requests/../").is_err());
    }

    #[test]
    fn test_dotted_names_are_accepted() {
        assert!(validate_storage_key("configs/a.b/v1.0").is_ok());
        assert!(validate_storage_key("configs/.../v1.0").is_ok());
        assert!(validate_storage_key("configs//v1.0").is_ok());
        assert!(validate_storage_key("idempotency_requests/k1/").is_ok());
    }
}
