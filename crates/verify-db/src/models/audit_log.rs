//! Verification log database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for verification_logs table
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogModel {
    pub id: i64,
    pub subject_id: i64,
    pub display_name: String,
    pub external_username: Option<String>,
    pub server_id: i64,
    /// One of `pending`, `success`, `failed`
    pub status: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
