//! Pending verification database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for pending_verifications table
#[derive(Debug, Clone, FromRow)]
pub struct PendingVerificationModel {
    pub subject_id: i64,
    pub server_id: i64,
    pub code: String,
    pub username_hint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
