//! Dispatcher identity extractor
//!
//! The command dispatcher authenticates with the shared trigger token and
//! names the chat user it acts for in the `x-actor-id` header.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use verify_core::Snowflake;

use crate::response::ApiError;
use crate::state::AppState;

/// Header carrying the acting chat user's id
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Chat user the dispatcher is acting for
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Snowflake,
}

impl Actor {
    /// Create a new Actor
    pub fn new(user_id: Snowflake) -> Self {
        Self { user_id }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::MissingAuth)?;

        let app_state = AppState::from_ref(state);
        if !app_state.accepts_token(bearer.token()) {
            tracing::warn!("Rejected trigger token");
            return Err(ApiError::InvalidToken);
        }

        let user_id = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<Snowflake>().ok())
            .ok_or(ApiError::MissingActor)?;

        Ok(Actor::new(user_id))
    }
}
