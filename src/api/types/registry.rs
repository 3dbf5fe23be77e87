//! Request and response bodies for the registry endpoints

use serde::{Deserialize, Serialize};

use crate::domain::{Config, ConfigForGroup, ConfigGroup, DomainError, Labels, Parameters, Version};

fn version_from(value: f64) -> Result<Version, DomainError> {
    Version::new(value).map_err(|e| DomainError::validation(e.to_string()))
}

/// Body of `POST /configs`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateConfigRequest {
    pub name: String,
    pub version: f64,
    #[serde(default)]
    pub parameters: Option<Parameters>,
}

impl CreateConfigRequest {
    pub fn into_config(self) -> Result<Config, DomainError> {
        Ok(Config::new(
            self.name,
            version_from(self.version)?,
            self.parameters.unwrap_or_default(),
        ))
    }
}

/// A group member as sent by clients
#[derive(Debug, Clone, Deserialize)]
pub struct MemberRequest {
    pub name: String,
    #[serde(default)]
    pub labels: Option<Labels>,
    #[serde(default)]
    pub parameters: Option<Parameters>,
}

impl From<MemberRequest> for ConfigForGroup {
    fn from(request: MemberRequest) -> Self {
        ConfigForGroup::new(
            request.name,
            request.labels.unwrap_or_default(),
            request.parameters.unwrap_or_default(),
        )
    }
}

/// Body of `POST /config-groups`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateConfigGroupRequest {
    pub name: String,
    pub version: f64,
    #[serde(default)]
    pub configurations: Option<Vec<MemberRequest>>,
}

impl CreateConfigGroupRequest {
    pub fn into_group(self) -> Result<ConfigGroup, DomainError> {
        let members = self
            .configurations
            .unwrap_or_default()
            .into_iter()
            .map(ConfigForGroup::from)
            .collect();

        Ok(ConfigGroup::new(self.name, version_from(self.version)?, members))
    }
}

/// Plain acknowledgement body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response of a label query
#[derive(Debug, Clone, Serialize)]
pub struct MembersResponse {
    pub configurations: Vec<ConfigForGroup>,
    pub total: usize,
}

impl From<Vec<ConfigForGroup>> for MembersResponse {
    fn from(configurations: Vec<ConfigForGroup>) -> Self {
        let total = configurations.len();
        Self {
            configurations,
            total,
        }
    }
}

/// Response of a label bulk delete
#[derive(Debug, Clone, Serialize)]
pub struct DeletedMembersResponse {
    pub message: String,
    pub removed: usize,
}
