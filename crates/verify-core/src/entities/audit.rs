//! Audit entries - append-only record of verification attempts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::Snowflake;

/// Status recorded with an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Pending,
    Success,
    Failed,
}

impl AuditStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Parse the stored representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry to append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub subject_id: Snowflake,
    pub display_name: String,
    pub external_username: Option<String>,
    pub server_id: Snowflake,
    pub status: AuditStatus,
    pub message: String,
}

impl NewAuditEntry {
    pub fn new(
        subject_id: Snowflake,
        display_name: impl Into<String>,
        server_id: Snowflake,
        status: AuditStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            subject_id,
            display_name: display_name.into(),
            external_username: None,
            server_id,
            status,
            message: message.into(),
        }
    }

    pub fn with_external_username(mut self, username: Option<String>) -> Self {
        self.external_username = username;
        self
    }
}

/// A stored audit entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub subject_id: Snowflake,
    pub display_name: String,
    pub external_username: Option<String>,
    pub server_id: Snowflake,
    pub status: AuditStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
