//! Infrastructure layer - Storage backends, services and runtime plumbing

pub mod logging;
pub mod observability;
pub mod rate_limit;
pub mod services;
pub mod storage;
