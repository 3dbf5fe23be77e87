//! Storage infrastructure - Key-value backends and the typed entity store

mod consul;
mod entity_store;
mod factory;
mod in_memory;
mod redis;

pub use consul::{ConsulConfig, ConsulKeyValueStore};
pub use entity_store::EntityStore;
pub use factory::{StorageConfig, StorageFactory, StorageType};
pub use in_memory::InMemoryKeyValueStore;
pub use redis::{RedisConfig, RedisKeyValueStore};
