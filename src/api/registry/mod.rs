//! Registry endpoints for configs, config groups and group membership

pub mod config_groups;
pub mod configs;
pub mod members;

use std::str::FromStr;

use axum::{
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::Version;

/// Create registry API router
pub fn create_registry_router() -> Router<AppState> {
    Router::new()
        // Configs
        .route("/configs", post(configs::create_config))
        .route(
            "/configs/{name}/{version}",
            get(configs::get_config).delete(configs::delete_config),
        )
        // Config groups
        .route("/config-groups", post(config_groups::create_config_group))
        .route(
            "/config-groups/{name}/{version}",
            get(config_groups::get_config_group).delete(config_groups::delete_config_group),
        )
        // Membership
        .route(
            "/config-groups/{name}/{version}/members",
            get(members::query_members).post(members::add_member),
        )
        .route(
            "/config-groups/{name}/{version}/members/{member}",
            axum::routing::delete(members::remove_member),
        )
        .route(
            "/config-groups/{name}/{version}/labels/{selector}",
            get(members::query_by_selector).delete(members::delete_by_selector),
        )
}

/// Parses a version path segment such as `1.0` or `2`
pub(crate) fn parse_version(raw: &str) -> Result<Version, ApiError> {
    Version::from_str(raw)
        .map_err(|e| ApiError::bad_request(format!("Invalid version '{}': {}", raw, e)))
}
