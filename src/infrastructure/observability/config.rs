//! Observability settings: OTLP trace export and the Prometheus scrape route

use serde::Deserialize;

use crate::domain::DomainError;

/// Paths served by the registry itself, which the scrape route must not shadow
const RESERVED_PATHS: &[&str] = &["/configs", "/config-groups", "/health", "/ready", "/live"];

/// `[observability]` section of the application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub tracing: TracingConfig,
    pub metrics: MetricsConfig,
}

impl ObservabilityConfig {
    /// Rejects settings that would fail or misroute at startup
    pub fn validate(&self) -> Result<(), DomainError> {
        self.tracing.validate()?;
        self.metrics.validate()
    }
}

/// OTLP trace export, off unless a collector is configured
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub enabled: bool,
    pub otlp_endpoint: String,
    /// `service.name` attached to exported spans
    pub service_name: String,
    /// Fraction of traces kept
    pub sampling_ratio: f64,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            service_name: env!("CARGO_PKG_NAME").to_string(),
            sampling_ratio: 1.0,
        }
    }
}

impl TracingConfig {
    /// Sampling ratio clamped into `0.0..=1.0`; a non-finite value keeps every trace
    pub fn effective_sampling_ratio(&self) -> f64 {
        if self.sampling_ratio.is_finite() {
            self.sampling_ratio.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        if !self.enabled {
            return Ok(());
        }

        if self.otlp_endpoint.trim().is_empty() {
            return Err(DomainError::configuration(
                "observability.tracing.otlp_endpoint is required when tracing is enabled",
            ));
        }

        if self.service_name.trim().is_empty() {
            return Err(DomainError::configuration(
                "observability.tracing.service_name must not be empty",
            ));
        }

        Ok(())
    }
}

/// Prometheus scrape endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Route the scrape endpoint is mounted on, with one leading slash and none trailing
    pub fn route_path(&self) -> String {
        let trimmed = self.path.trim().trim_matches('/');
        format!("/{}", trimmed)
    }

    fn validate(&self) -> Result<(), DomainError> {
        if !self.enabled {
            return Ok(());
        }

        let path = self.route_path();
        if path == "/" {
            return Err(DomainError::configuration(
                "observability.metrics.path must not be the root path",
            ));
        }

        let shadowed = RESERVED_PATHS.iter().any(|reserved| {
            path == *reserved || path.starts_with(&format!("{}/", reserved))
        });
        if shadowed {
            return Err(DomainError::configuration(format!(
                "observability.metrics.path '{}' collides with a registry route",
                path
            )));
        }

        Ok(())
    }
}
