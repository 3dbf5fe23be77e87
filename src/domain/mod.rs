//! Domain layer - Core registry entities, identities and traits

pub mod error;
pub mod idempotency;
pub mod registry;
pub mod storage;

pub use error::DomainError;
pub use idempotency::{IdempotencyRecord, IdempotencyStatus, Reservation};
pub use registry::{
    Config, ConfigForGroup, ConfigGroup, EntityKey, EntityKind, IdempotencyKey, Labels,
    Parameters, Version, VersionError,
};
pub use storage::{KeyValueStore, StorageEntity, StorageKey};
