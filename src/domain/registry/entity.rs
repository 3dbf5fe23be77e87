//! Registry entities - configs, config groups and group members

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::identity::{EntityKey, Version};
use super::labels::{self, Labels};
use crate::domain::storage::StorageEntity;

/// Free-form configuration parameters
pub type Parameters = BTreeMap<String, String>;

/// Treats an explicit JSON `null` like an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A named, versioned bag of string parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    pub version: Version,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Parameters,
}

impl Config {
    pub fn new(name: impl Into<String>, version: Version, parameters: Parameters) -> Self {
        Self {
            name: name.into(),
            version,
            parameters,
        }
    }
}

impl StorageEntity for Config {
    type Key = EntityKey;

    fn key(&self) -> Self::Key {
        EntityKey::config(self.name.clone(), self.version)
    }
}

/// A member of a config group
///
/// Members are identified by name only within their group; labels never take part in
/// identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigForGroup {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Labels,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Parameters,
}

impl ConfigForGroup {
    pub fn new(name: impl Into<String>, labels: Labels, parameters: Parameters) -> Self {
        Self {
            name: name.into(),
            labels,
            parameters,
        }
    }

    pub fn matches(&self, query: &Labels) -> bool {
        labels::matches(&self.labels, query)
    }
}

/// A named, versioned, insertion-ordered collection of members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigGroup {
    pub name: String,
    pub version: Version,
    #[serde(default, deserialize_with = "null_as_default")]
    pub configurations: Vec<ConfigForGroup>,
}

impl ConfigGroup {
    pub fn new(
        name: impl Into<String>,
        version: Version,
        configurations: Vec<ConfigForGroup>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            configurations,
        }
    }

    /// Appends a member at the tail; duplicate names are allowed
    pub fn push_member(&mut self, member: ConfigForGroup) {
        self.configurations.push(member);
    }

    /// Removes the first member with the given name, keeping the rest in order
    pub fn remove_first_named(&mut self, member_name: &str) -> Option<ConfigForGroup> {
        let index = self
            .configurations
            .iter()
            .position(|member| member.name == member_name)?;

        Some(self.configurations.remove(index))
    }

    /// Returns clones of the members matching the query, in insertion order
    pub fn members_matching(&self, query: &Labels) -> Vec<ConfigForGroup> {
        self.configurations
            .iter()
            .filter(|member| member.matches(query))
            .cloned()
            .collect()
    }

    /// Removes every member matching the query, keeping survivors in order
    ///
    /// Returns the number of removed members.
    pub fn remove_matching(&mut self, query: &Labels) -> usize {
        let before = self.configurations.len();
        self.configurations.retain(|member| !member.matches(query));
        before - self.configurations.len()
    }
}

impl StorageEntity for ConfigGroup {
    type Key = EntityKey;

    fn key(&self) -> Self::Key {
        EntityKey::config_group(self.name.clone(), self.version)
    }
}
