//! Observability infrastructure - Tracing and Metrics

mod config;
mod metrics;
mod tracing_setup;

pub use config::{MetricsConfig, ObservabilityConfig, TracingConfig};
pub use metrics::{
    create_metrics_router, init_metrics, record_http_request, record_idempotent_replay,
    record_rate_limited, PrometheusMetrics,
};
pub use tracing_setup::{build_tracer_provider, shutdown_tracing};
