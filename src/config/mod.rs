//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, ConsulSettings, LogFormat, LoggingConfig, RateLimitSettings, RedisSettings,
    RegistryConfig, ServerConfig, StorageSettings,
};
