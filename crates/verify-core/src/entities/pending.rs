//! PendingVerification entity - one outstanding verification attempt per (subject, server)

use chrono::{DateTime, Duration, Utc};

use crate::value_objects::{Snowflake, VerificationCode};

/// Lifetime of an issued code
pub const VERIFICATION_TTL_MINUTES: i64 = 30;

/// An issued, not yet consumed, verification attempt
///
/// Never mutated after creation: it is replaced by a reissue, deleted on
/// completion, or deleted on reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    pub subject_id: Snowflake,
    pub server_id: Snowflake,
    pub code: VerificationCode,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// External username the subject claimed when starting, tried first by the scanner
    pub username_hint: Option<String>,
}

impl PendingVerification {
    /// Create a new attempt with a fresh code, expiring after the standard TTL
    pub fn new(subject_id: Snowflake, server_id: Snowflake, username_hint: Option<String>) -> Self {
        Self::issued_at(
            subject_id,
            server_id,
            VerificationCode::generate(),
            Utc::now(),
            username_hint,
        )
    }

    /// Create an attempt with an explicit code and creation instant
    pub fn issued_at(
        subject_id: Snowflake,
        server_id: Snowflake,
        code: VerificationCode,
        created_at: DateTime<Utc>,
        username_hint: Option<String>,
    ) -> Self {
        let username_hint = username_hint
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
        Self {
            subject_id,
            server_id,
            code,
            created_at,
            expires_at: created_at + Duration::minutes(VERIFICATION_TTL_MINUTES),
            username_hint,
        }
    }

    /// Check if the attempt is past its expiry at `now`
    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Check if the attempt is expired right now
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Time left before expiry, zero once expired
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}
