//! API middleware components

pub mod idempotency;
pub mod metrics;
pub mod rate_limit;

pub use idempotency::{idempotency_middleware, IDEMPOTENCY_HEADER};
pub use metrics::metrics_middleware;
pub use rate_limit::{rate_limit_middleware, RATE_LIMIT_MESSAGE};
