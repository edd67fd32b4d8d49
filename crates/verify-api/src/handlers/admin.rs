//! Admin handlers
//!
//! Server-management endpoints. Permission checks happen in the service
//! against the acting member's live permissions.

use axum::{
    extract::{Path, State},
    Json,
};
use verify_service::dto::{
    AddRoleRequest, AuditEntryResponse, PolicyResponse, RecentLogsQuery, ResetResponse,
    RoleChangeResponse, SetupRequest, UpdateConfigRequest,
};
use verify_service::AdminService;

use crate::extractors::{
    Actor, OptionalValidatedJson, ServerPath, ServerRolePath, ServerUserPath, ValidatedJson,
    ValidatedQuery,
};
use crate::response::ApiResult;
use crate::state::AppState;

/// Force a member to verify again
///
/// DELETE /servers/{server_id}/links/{user_id}
pub async fn reset_verification(
    State(state): State<AppState>,
    actor: Actor,
    Path(path): Path<ServerUserPath>,
) -> ApiResult<Json<ResetResponse>> {
    let server_id = path.server_id()?;
    let target = path.user_id()?;

    let service = AdminService::new(state.service_context());
    let response = service
        .reset_verification(actor.user_id, server_id, target)
        .await?;
    Ok(Json(response))
}

/// Quick setup of channel and roles
///
/// POST /servers/{server_id}/config/setup
pub async fn setup(
    State(state): State<AppState>,
    actor: Actor,
    Path(path): Path<ServerPath>,
    ValidatedJson(request): ValidatedJson<SetupRequest>,
) -> ApiResult<Json<PolicyResponse>> {
    let server_id = path.server_id()?;

    let service = AdminService::new(state.service_context());
    Ok(Json(service.setup(actor.user_id, server_id, request).await?))
}

/// Effective policy
///
/// GET /servers/{server_id}/config
pub async fn get_config(
    State(state): State<AppState>,
    actor: Actor,
    Path(path): Path<ServerPath>,
) -> ApiResult<Json<PolicyResponse>> {
    let server_id = path.server_id()?;

    let service = AdminService::new(state.service_context());
    Ok(Json(service.get_config(actor.user_id, server_id).await?))
}

/// Partial policy update
///
/// PATCH /servers/{server_id}/config
pub async fn configure(
    State(state): State<AppState>,
    actor: Actor,
    Path(path): Path<ServerPath>,
    ValidatedJson(request): ValidatedJson<UpdateConfigRequest>,
) -> ApiResult<Json<PolicyResponse>> {
    let server_id = path.server_id()?;

    let service = AdminService::new(state.service_context());
    Ok(Json(service.configure(actor.user_id, server_id, request).await?))
}

/// Add a verification role
///
/// PUT /servers/{server_id}/config/roles/{role_id}
pub async fn add_verification_role(
    State(state): State<AppState>,
    actor: Actor,
    Path(path): Path<ServerRolePath>,
    OptionalValidatedJson(request): OptionalValidatedJson<AddRoleRequest>,
) -> ApiResult<Json<RoleChangeResponse>> {
    let server_id = path.server_id()?;
    let role_id = path.role_id()?;

    let service = AdminService::new(state.service_context());
    let response = service
        .add_verification_role(actor.user_id, server_id, role_id, request)
        .await?;
    Ok(Json(response))
}

/// Remove a verification role
///
/// DELETE /servers/{server_id}/config/roles/{role_id}
pub async fn remove_verification_role(
    State(state): State<AppState>,
    actor: Actor,
    Path(path): Path<ServerRolePath>,
) -> ApiResult<Json<RoleChangeResponse>> {
    let server_id = path.server_id()?;
    let role_id = path.role_id()?;

    let service = AdminService::new(state.service_context());
    let response = service
        .remove_verification_role(actor.user_id, server_id, role_id)
        .await?;
    Ok(Json(response))
}

/// Recent audit entries, newest first
///
/// GET /servers/{server_id}/logs?limit=
pub async fn recent_logs(
    State(state): State<AppState>,
    actor: Actor,
    Path(path): Path<ServerPath>,
    ValidatedQuery(query): ValidatedQuery<RecentLogsQuery>,
) -> ApiResult<Json<Vec<AuditEntryResponse>>> {
    let server_id = path.server_id()?;

    let service = AdminService::new(state.service_context());
    Ok(Json(service.recent_logs(actor.user_id, server_id, query).await?))
}
