//! Shared HTTP plumbing: client construction and error mapping

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use verify_core::UpstreamError;

/// Default timeout for a single request
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeouts applied to every outbound request
#[derive(Debug, Clone, Copy)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl From<&verify_common::IdentityConfig> for HttpSettings {
    fn from(config: &verify_common::IdentityConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.request_timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

/// Build a client with bounded timeouts
pub(crate) fn build_client(settings: HttpSettings, user_agent: &str) -> reqwest::Client {
    match reqwest::Client::builder()
        .timeout(settings.timeout)
        .connect_timeout(settings.connect_timeout)
        .user_agent(user_agent)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "failed to build reqwest client; falling back to default client");
            reqwest::Client::new()
        }
    }
}

/// Map a transport-level reqwest error
pub(crate) fn map_send_error(e: &reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Timeout
    } else if e.is_connect() {
        UpstreamError::Connect(e.to_string())
    } else if e.is_decode() {
        UpstreamError::Decode(e.to_string())
    } else {
        UpstreamError::Transport(e.to_string())
    }
}

/// Map a non-success HTTP status
pub(crate) fn map_status(status: StatusCode) -> UpstreamError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamError::Forbidden,
        other => UpstreamError::Status(other.as_u16()),
    }
}

/// Fail on any non-success status
pub(crate) fn require_success(response: Response) -> Result<Response, UpstreamError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(map_status(response.status()))
    }
}

/// Treat 404 as `None`, any other failure as an error
pub(crate) fn optional_success(response: Response) -> Result<Option<Response>, UpstreamError> {
    if response.status() == StatusCode::NOT_FOUND {
        Ok(None)
    } else {
        require_success(response).map(Some)
    }
}

/// Decode a JSON body
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, UpstreamError> {
    response
        .json::<T>()
        .await
        .map_err(|e| UpstreamError::Decode(e.to_string()))
}

/// Join a base URL and a path without doubling slashes
pub(crate) fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
