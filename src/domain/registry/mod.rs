//! Registry domain - versioned configs, config groups and label matching

mod entity;
mod identity;
pub mod labels;

pub use entity::{Config, ConfigForGroup, ConfigGroup, Parameters};
pub use identity::{key_for, EntityKey, EntityKind, IdempotencyKey, Version, VersionError};
pub use labels::Labels;
