//! Server setup and initialization
//!
//! Wires the Postgres repositories and the outbound clients into the
//! service context, then serves the trigger API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;
use verify_common::{AppConfig, AppError};
use verify_db::{
    create_pool, ensure_schema, PgAuditLogRepository, PgPendingVerificationRepository,
    PgServerPolicyRepository, PgVerifiedLinkRepository,
};
use verify_platform::{DiscordClient, HttpSettings, RobloxDirectory};
use verify_service::{ScanConfig, ServiceContextBuilder};

use crate::middleware::{apply_middleware, request_timeout_for};
use crate::routes::create_router;
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let timeout = request_timeout_for(state.service_context().scan().timeout);
    let router = apply_middleware(create_router(), timeout);
    router.with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: &AppConfig) -> Result<AppState, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&verify_db::DatabaseConfig::from(&config.database))
        .await
        .map_err(AppError::database)?;
    ensure_schema(&pool).await.map_err(AppError::database)?;
    info!("PostgreSQL connection established");

    let http = HttpSettings::from(&config.identity);
    let platform = Arc::new(DiscordClient::from_config(&config.discord, http));
    let directory = Arc::new(RobloxDirectory::from_config(&config.identity));

    let scan = ScanConfig::from_settings(&config.scan, &config.identity);
    info!(
        concurrency = scan.concurrency,
        search_limit = scan.search_limit,
        timeout_secs = scan.timeout.as_secs(),
        authenticated_fetch = scan.session.is_some(),
        "Scan settings loaded"
    );

    let service_context = ServiceContextBuilder::new()
        .pending_repo(Arc::new(PgPendingVerificationRepository::new(pool.clone())))
        .link_repo(Arc::new(PgVerifiedLinkRepository::new(pool.clone())))
        .policy_repo(Arc::new(PgServerPolicyRepository::new(pool.clone())))
        .audit_repo(Arc::new(PgAuditLogRepository::new(pool)))
        .platform(platform)
        .directory(directory)
        .scan(scan)
        .build()
        .map_err(AppError::wiring)?;

    Ok(AppState::new(service_context, config.trigger.token.as_str()))
}

/// Run the HTTP server until ctrl-c
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::Bind { addr, source })?;

    info!("Trigger API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Serve)?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::wiring(format!("invalid bind address: {e}")))?;

    let state = create_app_state(&config).await?;
    let app = create_app(state);

    run_server(app, addr).await
}
