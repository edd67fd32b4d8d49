//! VerifiedLink entity - proof that a chat user owns an external account

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Snowflake, VerificationCode};

/// The established link for one (subject, server) key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedLink {
    pub subject_id: Snowflake,
    pub server_id: Snowflake,
    pub external_id: String,
    pub external_username: String,
    pub verified_at: DateTime<Utc>,
    /// The code that proved ownership
    pub code: VerificationCode,
}

impl VerifiedLink {
    pub fn new(
        subject_id: Snowflake,
        server_id: Snowflake,
        external_id: impl Into<String>,
        external_username: impl Into<String>,
        code: VerificationCode,
    ) -> Self {
        Self {
            subject_id,
            server_id,
            external_id: external_id.into(),
            external_username: external_username.into(),
            verified_at: Utc::now(),
            code,
        }
    }
}

/// An account in the external directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAccount {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
}

impl ExternalAccount {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}
