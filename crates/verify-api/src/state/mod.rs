//! Application state
//!
//! Holds the service context and the trigger token the dispatcher must present.

use std::sync::Arc;

use verify_service::ServiceContext;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Service context containing all dependencies
    service_context: Arc<ServiceContext>,
    trigger_token: Arc<str>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service_context: ServiceContext, trigger_token: impl Into<Arc<str>>) -> Self {
        Self {
            service_context: Arc::new(service_context),
            trigger_token: trigger_token.into(),
        }
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Compare a presented bearer token with the configured one
    pub fn accepts_token(&self, token: &str) -> bool {
        let expected = self.trigger_token.as_bytes();
        let presented = token.as_bytes();
        if expected.is_empty() || expected.len() != presented.len() {
            return false;
        }
        // Constant time over equal-length inputs
        expected
            .iter()
            .zip(presented)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service_context", &self.service_context)
            .field("trigger_token", &"<redacted>")
            .finish()
    }
}
