//! Member verification handlers
//!
//! Endpoints the dispatcher calls on behalf of the member being verified.

use axum::{
    extract::{Path, State},
    Json,
};
use verify_service::dto::{
    CheckVerificationRequest, CheckVerificationResponse, StartVerificationRequest,
    StartVerificationResponse, StatusResponse,
};
use verify_service::VerificationService;

use crate::extractors::{Actor, OptionalValidatedJson, ServerPath};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// Issue a verification code
///
/// POST /servers/{server_id}/verifications
pub async fn start_verification(
    State(state): State<AppState>,
    actor: Actor,
    Path(path): Path<ServerPath>,
    OptionalValidatedJson(request): OptionalValidatedJson<StartVerificationRequest>,
) -> ApiResult<Created<Json<StartVerificationResponse>>> {
    let server_id = path.server_id()?;

    let service = VerificationService::new(state.service_context());
    let response = service
        .start_verification(actor.user_id, server_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// Scan the member's profile for the issued code
///
/// POST /servers/{server_id}/verifications/check
pub async fn check_verification(
    State(state): State<AppState>,
    actor: Actor,
    Path(path): Path<ServerPath>,
    OptionalValidatedJson(request): OptionalValidatedJson<CheckVerificationRequest>,
) -> ApiResult<Json<CheckVerificationResponse>> {
    let server_id = path.server_id()?;

    let service = VerificationService::new(state.service_context());
    let response = service
        .check_verification(actor.user_id, server_id, request)
        .await?;
    Ok(Json(response))
}

/// Issue a fresh code for an already linked member
///
/// POST /servers/{server_id}/verifications/update
pub async fn start_update(
    State(state): State<AppState>,
    actor: Actor,
    Path(path): Path<ServerPath>,
    OptionalValidatedJson(request): OptionalValidatedJson<StartVerificationRequest>,
) -> ApiResult<Created<Json<StartVerificationResponse>>> {
    let server_id = path.server_id()?;

    let service = VerificationService::new(state.service_context());
    let response = service.start_update(actor.user_id, server_id, request).await?;
    Ok(Created(Json(response)))
}

/// Current link and outstanding attempt
///
/// GET /servers/{server_id}/verifications/@me
pub async fn status(
    State(state): State<AppState>,
    actor: Actor,
    Path(path): Path<ServerPath>,
) -> ApiResult<Json<StatusResponse>> {
    let server_id = path.server_id()?;

    let service = VerificationService::new(state.service_context());
    Ok(Json(service.status(actor.user_id, server_id).await?))
}

/// Cancel the outstanding attempt
///
/// DELETE /servers/{server_id}/verifications/@me
pub async fn cancel_verification(
    State(state): State<AppState>,
    actor: Actor,
    Path(path): Path<ServerPath>,
) -> ApiResult<NoContent> {
    let server_id = path.server_id()?;

    let service = VerificationService::new(state.service_context());
    service.cancel_verification(actor.user_id, server_id).await?;
    Ok(NoContent)
}
