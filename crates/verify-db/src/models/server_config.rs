//! Server configuration database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for server_configs table
#[derive(Debug, Clone, FromRow)]
pub struct ServerConfigModel {
    pub server_id: i64,
    pub verification_channel_id: Option<i64>,
    pub log_channel_id: Option<i64>,
    pub unverified_role_id: Option<i64>,
    pub auto_kick_unverified: bool,
    pub dm_on_verification: bool,
    pub allow_reverification: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for verification_roles table
#[derive(Debug, Clone, FromRow)]
pub struct VerificationRoleModel {
    pub server_id: i64,
    pub role_id: i64,
    pub role_name: Option<String>,
    pub role_color: Option<i32>,
    pub created_at: DateTime<Utc>,
}
