//! Middleware stack for the trigger API
//!
//! A timed-out request answers 503, the same as any other transient failure.

use std::time::Duration;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header::HeaderName, Request, StatusCode},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::extractors::ACTOR_HEADER;
use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request deadline; must exceed the whole-scan deadline
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

fn header_str<'r>(request: &'r Request<Body>, name: &str) -> &'r str {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

/// One span per dispatcher call, keyed by route template, actor and request id
fn request_span(request: &Request<Body>) -> tracing::Span {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    tracing::info_span!(
        "trigger",
        method = %request.method(),
        route,
        actor = header_str(request, ACTOR_HEADER),
        request_id = header_str(request, REQUEST_ID_HEADER),
    )
}

/// Request ids, tracing and the request deadline
pub fn apply_middleware(router: Router<AppState>, request_timeout: Duration) -> Router<AppState> {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(request_span)
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(TimeoutLayer::with_status_code(
                StatusCode::SERVICE_UNAVAILABLE,
                request_timeout,
            )),
    )
}

/// Request timeout leaving headroom over the scan deadline
pub fn request_timeout_for(scan_timeout: Duration) -> Duration {
    DEFAULT_REQUEST_TIMEOUT.max(scan_timeout + Duration::from_secs(10))
}
