//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("No pending verification for this server")]
    NoPendingVerification,

    #[error("Not verified in this server")]
    NotVerified,

    #[error("Member not found in server")]
    MemberNotFound,

    #[error("External account not found: {0}")]
    ExternalAccountNotFound(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid verification code: {0}")]
    InvalidCode(String),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Missing permission: {0}")]
    MissingPermission(String),

    // =========================================================================
    // Conflict / Business Rule Errors
    // =========================================================================
    #[error("Already verified as {external_username}; reverification is disabled")]
    ReverificationDisabled { external_username: String },

    #[error("Verification code has expired")]
    VerificationExpired,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::NoPendingVerification => "NO_PENDING_VERIFICATION",
            Self::NotVerified => "NOT_VERIFIED",
            Self::MemberNotFound => "UNKNOWN_MEMBER",
            Self::ExternalAccountNotFound(_) => "UNKNOWN_EXTERNAL_ACCOUNT",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidCode(_) => "INVALID_CODE",

            // Authorization
            Self::MissingPermission(_) => "MISSING_PERMISSIONS",

            // Conflict / Business Rules
            Self::ReverificationDisabled { .. } => "REVERIFICATION_DISABLED",
            Self::VerificationExpired => "VERIFICATION_EXPIRED",

            // Infrastructure
            Self::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NoPendingVerification
                | Self::NotVerified
                | Self::MemberNotFound
                | Self::ExternalAccountNotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_) | Self::InvalidCode(_))
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::MissingPermission(_))
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ReverificationDisabled { .. })
    }

    /// Check if the attempt ran out of time
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::VerificationExpired)
    }

    /// Check if retrying later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable(_))
    }

    /// Missing-permission error naming the permission
    pub fn missing(permission: &str) -> Self {
        Self::MissingPermission(permission.to_string())
    }

    /// HTTP status the trigger API answers with
    pub fn status_code(&self) -> u16 {
        if self.is_not_found() {
            404
        } else if self.is_authorization() {
            403
        } else if self.is_validation() {
            400
        } else if self.is_conflict() {
            409
        } else if self.is_expired() {
            410
        } else if self.is_transient() {
            503
        } else {
            500
        }
    }
}
