//! Entity identities and the storage key scheme
//!
//! Every persisted record is addressed by a string key derived from its kind, name and
//! version. Versions are held at a fixed precision of one decimal place so that two
//! distinct identities can never format to the same key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::storage::StorageKey;

/// Key prefix for configs
const CONFIGS_PREFIX: &str = "configs";
/// Key prefix for config groups
const CONFIG_GROUPS_PREFIX: &str = "configGroups";
/// Key prefix for idempotency markers
const IDEMPOTENCY_PREFIX: &str = "idempotency_requests";

/// Errors raised when building a version
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VersionError {
    #[error("version must be a finite number, got {0}")]
    NotFinite(f64),

    #[error("version must not be negative, got {0}")]
    Negative(f64),

    #[error("version {0} is too large")]
    TooLarge(f64),

    #[error("invalid version '{0}'")]
    Unparsable(String),
}

/// A version number stored in tenths
///
/// `1.04` and `1.0` are the same version; inputs are rounded to the nearest tenth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Version {
    tenths: u32,
}

impl Version {
    pub fn new(value: f64) -> Result<Self, VersionError> {
        if !value.is_finite() {
            return Err(VersionError::NotFinite(value));
        }

        let tenths = (value * 10.0).round();

        if tenths < 0.0 {
            return Err(VersionError::Negative(value));
        }
        if tenths > f64::from(u32::MAX) {
            return Err(VersionError::TooLarge(value));
        }

        Ok(Self {
            tenths: tenths as u32,
        })
    }

    /// Builds a version from its tenths representation (`15` is `1.5`)
    pub const fn from_tenths(tenths: u32) -> Self {
        Self { tenths }
    }

    pub fn tenths(&self) -> u32 {
        self.tenths
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.tenths) / 10.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tenths / 10, self.tenths % 10)
    }
}

impl TryFrom<f64> for Version {
    type Error = VersionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Version> for f64 {
    fn from(version: Version) -> Self {
        version.as_f64()
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| VersionError::Unparsable(s.to_string()))?;
        Self::new(value)
    }
}

/// Kinds of versioned entities kept in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Config,
    ConfigGroup,
}

impl EntityKind {
    fn prefix(&self) -> &'static str {
        match self {
            Self::Config => CONFIGS_PREFIX,
            Self::ConfigGroup => CONFIG_GROUPS_PREFIX,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "Config"),
            Self::ConfigGroup => write!(f, "Config group"),
        }
    }
}

/// Builds the storage key for a versioned entity
///
/// The version is always the final segment, so names containing `/` cannot collide
/// with another identity.
pub fn key_for(kind: EntityKind, name: &str, version: Version) -> String {
    format!("{}/{}/v{}", kind.prefix(), name, version)
}

/// Full identity of a config or config group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    kind: EntityKind,
    name: String,
    version: Version,
}

impl EntityKey {
    pub fn new(kind: EntityKind, name: impl Into<String>, version: Version) -> Self {
        Self {
            kind,
            name: name.into(),
            version,
        }
    }

    pub fn config(name: impl Into<String>, version: Version) -> Self {
        Self::new(EntityKind::Config, name, version)
    }

    pub fn config_group(name: impl Into<String>, version: Version) -> Self {
        Self::new(EntityKind::ConfigGroup, name, version)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

impl StorageKey for EntityKey {
    fn storage_key(&self) -> String {
        key_for(self.kind, &self.name, self.version)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' v{}", self.kind, self.name, self.version)
    }
}

/// Client supplied idempotency key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl StorageKey for IdempotencyKey {
    fn storage_key(&self) -> String {
        format!("{}/{}/", IDEMPOTENCY_PREFIX, self.0)
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "idempotency key '{}'", self.0)
    }
}
