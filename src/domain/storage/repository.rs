//! Key-value collaborator trait

use async_trait::async_trait;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Raw key-value backend the registry persists into
///
/// Keys are plain strings; values are opaque bytes. No transactions are assumed beyond
/// the single-key `put_if_absent` and `compare_and_swap` primitives.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored bytes, or `None` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError>;

    /// Unconditionally writes the value, last writer wins
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), DomainError>;

    /// Atomically writes the value only if the key is absent, returns true if written
    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool, DomainError>;

    /// Atomically replaces the value only if the stored bytes still equal `expected`,
    /// returns true if written
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Vec<u8>,
        value: Vec<u8>,
    ) -> Result<bool, DomainError>;

    /// Deletes the key, returns true if it existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Short name of the backend for logs and health output
    fn backend_name(&self) -> &'static str;
}
