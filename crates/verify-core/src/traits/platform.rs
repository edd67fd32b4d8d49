//! Outbound ports to the chat platform and the external identity directory
//!
//! Every call is independently fallible and returns [`UpstreamError`]; callers
//! decide whether a failure is fatal.

use async_trait::async_trait;
use thiserror::Error;

use crate::entities::{ExternalAccount, Member};
use crate::value_objects::{SessionCredential, Snowflake};

/// Result type for calls to external services
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Failure talking to an external service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("rate limited")]
    RateLimited,

    #[error("forbidden")]
    Forbidden,

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("request failed: {0}")]
    Transport(String),
}

impl UpstreamError {
    /// Whether the failure says nothing about the request itself
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Connect(_) | Self::Transport(_) | Self::RateLimited
        ) || matches!(self, Self::Status(code) if *code >= 500)
    }
}

/// A short message with a title, rendered by the platform as an embed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub color: u32,
}

impl Notice {
    pub const GREEN: u32 = 0x0057_F287;
    pub const RED: u32 = 0x00ED_4245;
    pub const YELLOW: u32 = 0x00FE_E75C;

    pub fn new(title: impl Into<String>, description: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            fields: Vec::new(),
            color,
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

// ============================================================================
// Chat Platform
// ============================================================================

/// Narrow capability interface over the chat platform
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Fetch a server member; `None` if the user is not in the server
    async fn fetch_member(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
    ) -> UpstreamResult<Option<Member>>;

    /// Check if a member currently holds a role
    async fn has_role(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> UpstreamResult<bool> {
        Ok(self
            .fetch_member(server_id, user_id)
            .await?
            .is_some_and(|m| m.has_role(role_id)))
    }

    async fn add_role(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> UpstreamResult<()>;

    async fn remove_role(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> UpstreamResult<()>;

    /// Set the member's server nickname
    async fn set_display_name(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
        name: &str,
    ) -> UpstreamResult<()>;

    async fn send_direct_message(&self, user_id: Snowflake, notice: &Notice) -> UpstreamResult<()>;

    async fn send_channel_message(
        &self,
        channel_id: Snowflake,
        notice: &Notice,
    ) -> UpstreamResult<()>;
}

// ============================================================================
// External Identity Directory
// ============================================================================

/// Read-only view of the external platform's user directory
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Exact username lookup
    async fn lookup_by_name(&self, username: &str) -> UpstreamResult<Vec<ExternalAccount>>;

    /// Fuzzy keyword search
    async fn search(&self, keyword: &str, limit: u32) -> UpstreamResult<Vec<ExternalAccount>>;

    /// Public profile description
    async fn fetch_description(&self, account_id: &str) -> UpstreamResult<Option<String>>;

    /// Secondary public profile-info endpoint
    async fn fetch_profile_info(&self, account_id: &str) -> UpstreamResult<Option<String>>;

    /// Rendered profile page markup
    async fn fetch_profile_markup(
        &self,
        account_id: &str,
        session: Option<&SessionCredential>,
    ) -> UpstreamResult<String>;

    /// Description as seen through an authenticated session
    async fn fetch_authenticated_profile(
        &self,
        account_id: &str,
        session: &SessionCredential,
    ) -> UpstreamResult<Option<String>>;
}
