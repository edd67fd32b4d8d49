//! Verified link database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for verified_links table
#[derive(Debug, Clone, FromRow)]
pub struct VerifiedLinkModel {
    pub id: i64,
    pub subject_id: i64,
    pub server_id: i64,
    pub external_id: String,
    pub external_username: String,
    pub verified_at: DateTime<Utc>,
    pub code: String,
}
