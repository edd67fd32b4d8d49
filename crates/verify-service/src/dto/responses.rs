//! Response DTOs for dispatcher operations
//!
//! Snowflake IDs are serialized as strings for JavaScript compatibility.

use chrono::{DateTime, Utc};
use serde::Serialize;

use verify_core::entities::AuditStatus;
use verify_core::value_objects::Snowflake;

// ============================================================================
// Common Response Types
// ============================================================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

// ============================================================================
// Verification Responses
// ============================================================================

/// An account in the external directory
#[derive(Debug, Clone, Serialize)]
pub struct ExternalAccountResponse {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// An outstanding verification attempt
#[derive(Debug, Clone, Serialize)]
pub struct PendingResponse {
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username_hint: Option<String>,
}

/// An established link
#[derive(Debug, Clone, Serialize)]
pub struct LinkResponse {
    pub subject_id: Snowflake,
    pub server_id: Snowflake,
    pub external_id: String,
    pub external_username: String,
    pub verified_at: DateTime<Utc>,
}

/// Issued code plus what the member should do with it
#[derive(Debug, Serialize)]
pub struct StartVerificationResponse {
    pub pending: PendingResponse,
    /// Account the hint resolved to, when it resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<ExternalAccountResponse>,
    /// Link being replaced, for reverification and updates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_link: Option<LinkResponse>,
}

/// Side effects applied on completion
#[derive(Debug, Clone, Serialize)]
pub struct CompletionResponse {
    pub roles_added: Vec<Snowflake>,
    pub roles_removed: Vec<Snowflake>,
    pub roles_failed: Vec<Snowflake>,
    pub renamed: bool,
    pub notified: bool,
}

/// Outcome of a profile check
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckVerificationResponse {
    /// The code was found and the link is now established
    Verified {
        link: LinkResponse,
        completion: CompletionResponse,
    },
    /// Nothing outstanding, but the member is already linked
    AlreadyVerified { link: LinkResponse },
    /// The code is not in any candidate profile yet
    NotYetVerified {
        code: String,
        expires_at: DateTime<Utc>,
    },
}

/// Current verification state for a member
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingResponse>,
}

// ============================================================================
// Admin Responses
// ============================================================================

/// A configured verification role
#[derive(Debug, Clone, Serialize)]
pub struct RoleResponse {
    pub role_id: Snowflake,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_color: Option<i32>,
}

/// Effective server policy
#[derive(Debug, Clone, Serialize)]
pub struct PolicyResponse {
    pub server_id: Snowflake,
    pub verification_roles: Vec<RoleResponse>,
    pub unverified_role_id: Option<Snowflake>,
    pub verification_channel_id: Option<Snowflake>,
    pub log_channel_id: Option<Snowflake>,
    pub auto_kick_unverified: bool,
    pub dm_on_verification: bool,
    pub allow_reverification: bool,
    /// False while the server runs on defaults
    pub stored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Result of an idempotent role change
#[derive(Debug, Serialize)]
pub struct RoleChangeResponse {
    pub role_id: Snowflake,
    /// False when the role was already in the requested state
    pub changed: bool,
}

/// Result of a forced reverification
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub removed_link: LinkResponse,
    pub removed_pending: bool,
}

/// A stored audit entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntryResponse {
    pub id: i64,
    pub subject_id: Snowflake,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_username: Option<String>,
    pub status: AuditStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
