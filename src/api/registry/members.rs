//! Group membership endpoints

use axum::extract::{Path, Query, State};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, DeletedMembersResponse, Json, MemberRequest, MembersResponse, MessageResponse,
};
use crate::domain::registry::labels;
use crate::domain::{ConfigForGroup, Labels};

use super::parse_version;

/// POST /config-groups/{name}/{version}/members
pub async fn add_member(
    State(state): State<AppState>,
    Path((name, version)): Path<(String, String)>,
    Json(request): Json<MemberRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let version = parse_version(&version)?;

    state
        .membership_service
        .add_member(&name, version, ConfigForGroup::from(request))
        .await?;

    Ok(Json(MessageResponse::new(
        "Configuration added to group successfully",
    )))
}

/// DELETE /config-groups/{name}/{version}/members/{member}
pub async fn remove_member(
    State(state): State<AppState>,
    Path((name, version, member)): Path<(String, String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let version = parse_version(&version)?;

    state
        .membership_service
        .remove_member(&name, version, &member)
        .await?;

    Ok(Json(MessageResponse::new(
        "Configuration deleted from group successfully",
    )))
}

/// GET /config-groups/{name}/{version}/members?key=value
///
/// Every query parameter is a label the member must carry. No parameters selects all members.
pub async fn query_members(
    State(state): State<AppState>,
    Path((name, version)): Path<(String, String)>,
    Query(query): Query<Labels>,
) -> Result<Json<MembersResponse>, ApiError> {
    let version = parse_version(&version)?;

    let members = state
        .membership_service
        .query_by_labels(&name, version, &query)
        .await?;

    Ok(Json(MembersResponse::from(members)))
}

/// GET /config-groups/{name}/{version}/labels/{selector}
pub async fn query_by_selector(
    State(state): State<AppState>,
    Path((name, version, selector)): Path<(String, String, String)>,
) -> Result<Json<MembersResponse>, ApiError> {
    let version = parse_version(&version)?;
    let query = labels::parse_selector(&selector);
    debug!(group = %name, selector = %selector, "Querying members by selector");

    let members = state
        .membership_service
        .query_by_labels(&name, version, &query)
        .await?;

    Ok(Json(MembersResponse::from(members)))
}

/// DELETE /config-groups/{name}/{version}/labels/{selector}
pub async fn delete_by_selector(
    State(state): State<AppState>,
    Path((name, version, selector)): Path<(String, String, String)>,
) -> Result<Json<DeletedMembersResponse>, ApiError> {
    let version = parse_version(&version)?;
    let query = labels::parse_selector(&selector);

    let removed = state
        .membership_service
        .delete_by_labels(&name, version, &query)
        .await?;

    Ok(Json(DeletedMembersResponse {
        message: "Configuration deleted from group successfully".to_string(),
        removed,
    }))
}
