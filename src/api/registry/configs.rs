//! Config endpoints

use axum::extract::{Path, State};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, CreateConfigRequest, Json, MessageResponse};
use crate::domain::Config;

use super::parse_version;

/// POST /configs
pub async fn create_config(
    State(state): State<AppState>,
    Json(request): Json<CreateConfigRequest>,
) -> Result<Json<Config>, ApiError> {
    debug!(name = %request.name, version = request.version, "Creating config");

    let config = request.into_config()?;
    let config = state.config_service.create(config).await?;

    Ok(Json(config))
}

/// GET /configs/{name}/{version}
pub async fn get_config(
    State(state): State<AppState>,
    Path((name, version)): Path<(String, String)>,
) -> Result<Json<Config>, ApiError> {
    let version = parse_version(&version)?;
    let config = state.config_service.get(&name, version).await?;

    Ok(Json(config))
}

/// DELETE /configs/{name}/{version}
pub async fn delete_config(
    State(state): State<AppState>,
    Path((name, version)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let version = parse_version(&version)?;
    state.config_service.delete(&name, version).await?;

    Ok(Json(MessageResponse::new("Configuration deleted successfully")))
}
