//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. Implementations must serialize writes per
//! (subject, server) key so that replace operations are observed atomically.

use async_trait::async_trait;

use crate::entities::{
    AuditEntry, NewAuditEntry, PendingVerification, ServerPolicy, ServerPolicyPatch, VerificationRole,
    VerifiedLink,
};
use crate::error::DomainError;
use crate::value_objects::{Snowflake, VerificationCode};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Pending Verification Repository
// ============================================================================

#[async_trait]
pub trait PendingVerificationRepository: Send + Sync {
    /// Find the outstanding attempt for a key (expired rows included)
    async fn find(
        &self,
        subject_id: Snowflake,
        server_id: Snowflake,
    ) -> RepoResult<Option<PendingVerification>>;

    /// Find an outstanding attempt in a server by its code
    async fn find_by_code(
        &self,
        server_id: Snowflake,
        code: &VerificationCode,
    ) -> RepoResult<Option<PendingVerification>>;

    /// Delete any attempt for the key and insert `pending`, as one unit
    ///
    /// Returns the superseded attempt, if there was one.
    async fn replace(
        &self,
        pending: &PendingVerification,
    ) -> RepoResult<Option<PendingVerification>>;

    /// Delete the attempt for a key; returns whether a row was removed
    async fn delete(&self, subject_id: Snowflake, server_id: Snowflake) -> RepoResult<bool>;

    /// Delete the attempt for a key only if it still carries `code`
    ///
    /// Guards completion against a reissue that happened mid-scan.
    async fn delete_if_code(
        &self,
        subject_id: Snowflake,
        server_id: Snowflake,
        code: &VerificationCode,
    ) -> RepoResult<bool>;
}

// ============================================================================
// Verified Link Repository
// ============================================================================

#[async_trait]
pub trait VerifiedLinkRepository: Send + Sync {
    /// Find the link for a key
    async fn find(
        &self,
        subject_id: Snowflake,
        server_id: Snowflake,
    ) -> RepoResult<Option<VerifiedLink>>;

    /// Delete any link for the key and insert `link`, as one unit
    async fn replace(&self, link: &VerifiedLink) -> RepoResult<()>;

    /// Delete the link for a key; returns whether a row was removed
    async fn delete(&self, subject_id: Snowflake, server_id: Snowflake) -> RepoResult<bool>;
}

// ============================================================================
// Server Policy Repository
// ============================================================================

#[async_trait]
pub trait ServerPolicyRepository: Send + Sync {
    /// Find the stored policy with its verification roles
    async fn find(&self, server_id: Snowflake) -> RepoResult<Option<ServerPolicy>>;

    /// Insert or update the scalar settings of a policy
    async fn save(&self, policy: &ServerPolicy) -> RepoResult<()>;

    /// Merge a patch into the stored policy, starting from the defaults when
    /// none is stored. Concurrent updates for one server apply one after another.
    async fn update(
        &self,
        server_id: Snowflake,
        patch: &ServerPolicyPatch,
    ) -> RepoResult<ServerPolicy>;

    /// Add a verification role; returns false if it was already configured
    async fn add_role(&self, role: &VerificationRole) -> RepoResult<bool>;

    /// Remove a verification role; returns false if it was not configured
    async fn remove_role(&self, server_id: Snowflake, role_id: Snowflake) -> RepoResult<bool>;
}

// ============================================================================
// Audit Log Repository
// ============================================================================

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Append an entry
    async fn append(&self, entry: &NewAuditEntry) -> RepoResult<AuditEntry>;

    /// Most recent entries for a server, newest first
    async fn list_by_server(&self, server_id: Snowflake, limit: i64) -> RepoResult<Vec<AuditEntry>>;
}
