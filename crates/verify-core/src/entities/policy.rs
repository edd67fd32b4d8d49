//! ServerPolicy entity - per-server verification settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// A role granted on successful verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRole {
    pub server_id: Snowflake,
    pub role_id: Snowflake,
    pub role_name: Option<String>,
    pub role_color: Option<i32>,
}

impl VerificationRole {
    pub fn new(server_id: Snowflake, role_id: Snowflake) -> Self {
        Self {
            server_id,
            role_id,
            role_name: None,
            role_color: None,
        }
    }
}

/// Effective verification policy for a server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerPolicy {
    pub server_id: Snowflake,
    pub verification_roles: Vec<VerificationRole>,
    pub unverified_role_id: Option<Snowflake>,
    pub verification_channel_id: Option<Snowflake>,
    pub log_channel_id: Option<Snowflake>,
    pub auto_kick_unverified: bool,
    pub dm_on_verification: bool,
    pub allow_reverification: bool,
    /// `None` until the policy has been stored at least once
    pub updated_at: Option<DateTime<Utc>>,
}

impl ServerPolicy {
    /// Policy used when the server has never been configured
    pub fn defaults(server_id: Snowflake) -> Self {
        Self {
            server_id,
            verification_roles: Vec::new(),
            unverified_role_id: None,
            verification_channel_id: None,
            log_channel_id: None,
            auto_kick_unverified: false,
            dm_on_verification: true,
            allow_reverification: true,
            updated_at: None,
        }
    }

    /// IDs of every role granted on verification, in configuration order
    pub fn verification_role_ids(&self) -> Vec<Snowflake> {
        self.verification_roles.iter().map(|r| r.role_id).collect()
    }

    /// Check whether this policy has ever been persisted
    #[inline]
    pub fn is_stored(&self) -> bool {
        self.updated_at.is_some()
    }
}

/// Partial update to a server's policy
///
/// Outer `None` leaves a field unchanged; for nullable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerPolicyPatch {
    pub unverified_role_id: Option<Option<Snowflake>>,
    pub verification_channel_id: Option<Option<Snowflake>>,
    pub log_channel_id: Option<Option<Snowflake>>,
    pub auto_kick_unverified: Option<bool>,
    pub dm_on_verification: Option<bool>,
    pub allow_reverification: Option<bool>,
}

impl ServerPolicyPatch {
    /// Check if the patch carries no changes at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the patch into `policy`
    pub fn apply(&self, policy: &mut ServerPolicy) {
        if let Some(v) = self.unverified_role_id {
            policy.unverified_role_id = v;
        }
        if let Some(v) = self.verification_channel_id {
            policy.verification_channel_id = v;
        }
        if let Some(v) = self.log_channel_id {
            policy.log_channel_id = v;
        }
        if let Some(v) = self.auto_kick_unverified {
            policy.auto_kick_unverified = v;
        }
        if let Some(v) = self.dm_on_verification {
            policy.dm_on_verification = v;
        }
        if let Some(v) = self.allow_reverification {
            policy.allow_reverification = v;
        }
    }

    /// Human-readable list of the settings this patch touches
    pub fn describe(&self) -> Vec<String> {
        fn id(v: Option<Snowflake>) -> String {
            v.map_or_else(|| "none".to_string(), |id| id.to_string())
        }

        let mut changes = Vec::new();
        if let Some(v) = self.unverified_role_id {
            changes.push(format!("unverified role: {}", id(v)));
        }
        if let Some(v) = self.verification_channel_id {
            changes.push(format!("verification channel: {}", id(v)));
        }
        if let Some(v) = self.log_channel_id {
            changes.push(format!("log channel: {}", id(v)));
        }
        if let Some(v) = self.auto_kick_unverified {
            changes.push(format!("auto-kick unverified: {v}"));
        }
        if let Some(v) = self.dm_on_verification {
            changes.push(format!("DM on verification: {v}"));
        }
        if let Some(v) = self.allow_reverification {
            changes.push(format!("allow reverification: {v}"));
        }
        changes
    }
}
