//! Config group endpoints

use axum::extract::{Path, State};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, CreateConfigGroupRequest, Json, MessageResponse};
use crate::domain::ConfigGroup;

use super::parse_version;

/// POST /config-groups
pub async fn create_config_group(
    State(state): State<AppState>,
    Json(request): Json<CreateConfigGroupRequest>,
) -> Result<Json<ConfigGroup>, ApiError> {
    debug!(name = %request.name, version = request.version, "Creating config group");

    let group = request.into_group()?;
    let group = state.config_group_service.create(group).await?;

    Ok(Json(group))
}

/// GET /config-groups/{name}/{version}
pub async fn get_config_group(
    State(state): State<AppState>,
    Path((name, version)): Path<(String, String)>,
) -> Result<Json<ConfigGroup>, ApiError> {
    let version = parse_version(&version)?;
    let group = state.config_group_service.get(&name, version).await?;

    Ok(Json(group))
}

/// DELETE /config-groups/{name}/{version}
pub async fn delete_config_group(
    State(state): State<AppState>,
    Path((name, version)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let version = parse_version(&version)?;
    state.config_group_service.delete(&name, version).await?;

    Ok(Json(MessageResponse::new(
        "Configuration group deleted successfully",
    )))
}
