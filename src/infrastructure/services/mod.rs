//! Infrastructure services

mod config_group_service;
mod config_service;
mod group_locks;
mod idempotency_service;
mod membership_service;

pub use config_group_service::ConfigGroupService;
pub use config_service::{ConfigService, CreatePolicy};
pub use group_locks::GroupLocks;
pub use idempotency_service::{IdempotencyService, DEFAULT_PENDING_TIMEOUT_SECS};
pub use membership_service::MembershipService;
