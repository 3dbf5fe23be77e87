use std::fmt;
use std::time::Duration;

use config::builder::{ConfigBuilder, DefaultState};
use config::ConfigError;
use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::observability::ObservabilityConfig;
use crate::infrastructure::rate_limit::{RateLimitConfig, DEFAULT_BURST, DEFAULT_REFILL_PER_SECOND};
use crate::infrastructure::services::DEFAULT_PENDING_TIMEOUT_SECS;
use crate::infrastructure::storage::{ConsulConfig, RedisConfig, StorageConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Key-value backend selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory`, `consul` or `redis`
    pub backend: String,
    pub consul: ConsulSettings,
    pub redis: RedisSettings,
    /// Namespace prepended to every Redis key
    pub key_prefix: Option<String>,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ConsulSettings {
    pub host: String,
    pub port: u16,
    pub scheme: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub refill_per_second: f64,
    pub burst: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Reject creates whose key already exists instead of replacing the entity
    pub strict_create: bool,
    /// Seconds before an unfinished idempotency reservation may be taken over
    pub idempotency_pending_timeout_secs: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            consul: ConsulSettings::default(),
            redis: RedisSettings::default(),
            key_prefix: None,
        }
    }
}

impl Default for ConsulSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8500,
            scheme: "http".to_string(),
            token: None,
            timeout_secs: 5,
        }
    }
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            strict_create: false,
            idempotency_pending_timeout_secs: DEFAULT_PENDING_TIMEOUT_SECS,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            refill_per_second: DEFAULT_REFILL_PER_SECOND,
            burst: DEFAULT_BURST,
        }
    }
}

impl fmt::Debug for ConsulSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsulSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("scheme", &self.scheme)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl StorageSettings {
    /// Resolves the configured backend into a factory configuration
    pub fn storage_config(&self) -> Result<StorageConfig, DomainError> {
        let storage_type = StorageType::from_str(&self.backend).ok_or_else(|| {
            DomainError::configuration(format!("Unknown storage backend '{}'", self.backend))
        })?;

        Ok(match storage_type {
            StorageType::InMemory => StorageConfig::in_memory(),
            StorageType::Consul => {
                let mut consul = ConsulConfig::new(&self.consul.host, self.consul.port)
                    .with_scheme(&self.consul.scheme)
                    .with_timeout(Duration::from_secs(self.consul.timeout_secs));
                if let Some(token) = &self.consul.token {
                    consul = consul.with_token(token);
                }
                StorageConfig::consul(consul)
            }
            StorageType::Redis => {
                let mut redis = RedisConfig::new(&self.redis.url);
                if let Some(prefix) = &self.key_prefix {
                    redis = redis.with_key_prefix(prefix);
                }
                StorageConfig::redis(redis)
            }
        })
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        if !settings.enabled {
            return RateLimitConfig::disabled();
        }
        RateLimitConfig::new(settings.refill_per_second, settings.burst)
    }
}

/// Plain environment variables honoured as defaults for deployments that predate `APP__*`
///
/// `DB` and `DBPORT` point at Consul, `PORT` is the listen port.
const LEGACY_ENV: [(&str, &str); 3] = [
    ("DB", "storage.consul.host"),
    ("DBPORT", "storage.consul.port"),
    ("PORT", "server.port"),
];

fn apply_legacy_env(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (variable, key) in LEGACY_ENV {
        if let Some(value) = lookup(variable).filter(|v| !v.trim().is_empty()) {
            builder = builder.set_default(key, value)?;
        }
    }
    Ok(builder)
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let builder = apply_legacy_env(config::Config::builder(), |name| {
            std::env::var(name).ok()
        })?;

        let config = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
