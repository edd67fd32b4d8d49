//! Request DTOs for dispatcher operations
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use serde::{Deserialize, Deserializer};
use validator::Validate;

use verify_core::entities::ServerPolicyPatch;
use verify_core::value_objects::Snowflake;

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// Verification Requests
// ============================================================================

/// Start (or restart) a verification
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct StartVerificationRequest {
    /// External username the member claims to own
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: Option<String>,

    /// Name shown in audit entries
    #[validate(length(max = 100, message = "Display name must be at most 100 characters"))]
    pub display_name: Option<String>,
}

/// Check the profile for the issued code
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CheckVerificationRequest {
    /// Overrides the member's server display name for candidate discovery
    #[validate(length(min = 1, max = 100, message = "Display name must be 1-100 characters"))]
    pub display_name: Option<String>,
}

// ============================================================================
// Admin Requests
// ============================================================================

/// Quick setup of the verification system
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetupRequest {
    pub verification_role_id: Snowflake,
    pub verification_channel_id: Snowflake,
    pub unverified_role_id: Option<Snowflake>,
}

/// Partial policy update; `null` clears an id, an absent field leaves it alone
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateConfigRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub unverified_role_id: Option<Option<Snowflake>>,

    #[serde(default, deserialize_with = "double_option")]
    pub verification_channel_id: Option<Option<Snowflake>>,

    #[serde(default, deserialize_with = "double_option")]
    pub log_channel_id: Option<Option<Snowflake>>,

    pub auto_kick_unverified: Option<bool>,
    pub dm_on_verification: Option<bool>,
    pub allow_reverification: Option<bool>,
}

impl From<UpdateConfigRequest> for ServerPolicyPatch {
    fn from(req: UpdateConfigRequest) -> Self {
        Self {
            unverified_role_id: req.unverified_role_id,
            verification_channel_id: req.verification_channel_id,
            log_channel_id: req.log_channel_id,
            auto_kick_unverified: req.auto_kick_unverified,
            dm_on_verification: req.dm_on_verification,
            allow_reverification: req.allow_reverification,
        }
    }
}

/// Optional metadata when adding a verification role
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AddRoleRequest {
    #[validate(length(min = 1, max = 100, message = "Role name must be 1-100 characters"))]
    pub role_name: Option<String>,

    #[validate(range(min = 0, max = 0x00FF_FFFF, message = "Color must be a 24-bit RGB value"))]
    pub role_color: Option<i32>,
}

/// Audit log listing
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RecentLogsQuery {
    #[validate(range(min = 1, max = 50, message = "Limit must be between 1 and 50"))]
    pub limit: Option<i64>,
}

impl RecentLogsQuery {
    pub const DEFAULT_LIMIT: i64 = 10;

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}
