//! Route definitions
//!
//! Dispatcher endpoints mounted under /api/v1, plus the health probe.

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{admin, health, verification};
use crate::state::AppState;

/// Create the main API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .nest("/api/v1", api_v1_routes())
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health::health_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(verification_routes())
        .merge(admin_routes())
}

/// Member verification routes
fn verification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/servers/:server_id/verifications",
            post(verification::start_verification),
        )
        .route(
            "/servers/:server_id/verifications/check",
            post(verification::check_verification),
        )
        .route(
            "/servers/:server_id/verifications/update",
            post(verification::start_update),
        )
        .route(
            "/servers/:server_id/verifications/@me",
            get(verification::status).delete(verification::cancel_verification),
        )
}

/// Admin routes
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/servers/:server_id/links/:user_id",
            delete(admin::reset_verification),
        )
        .route(
            "/servers/:server_id/config",
            get(admin::get_config).patch(admin::configure),
        )
        .route("/servers/:server_id/config/setup", post(admin::setup))
        .route(
            "/servers/:server_id/config/roles/:role_id",
            put(admin::add_verification_role).delete(admin::remove_verification_role),
        )
        .route("/servers/:server_id/logs", get(admin::recent_logs))
}
