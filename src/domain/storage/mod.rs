//! Storage domain - key-value collaborator and entity traits

mod entity;
mod repository;

pub use entity::{validate_storage_key, StorageEntity, StorageKey};
pub use repository::KeyValueStore;

#[cfg(test)]
pub use repository::MockKeyValueStore;
