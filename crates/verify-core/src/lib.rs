//! # verify-core
//!
//! Domain layer for account-link verification: pending attempts, verified links,
//! per-server policy, audit entries, and the ports the engine talks through
//! (persistence, chat platform, external identity directory).
//! This crate has zero dependencies on infrastructure (database, HTTP, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    AuditEntry, AuditStatus, ExternalAccount, Member, NewAuditEntry, PendingVerification,
    ServerPolicy, ServerPolicyPatch, VerificationRole, VerifiedLink, VERIFICATION_TTL_MINUTES,
};
pub use error::DomainError;
pub use traits::{
    AuditLogRepository, ChatPlatform, IdentityDirectory, Notice, PendingVerificationRepository,
    RepoResult, ServerPolicyRepository, UpstreamError, UpstreamResult, VerifiedLinkRepository,
};
pub use value_objects::{
    normalize_for_match, CodeParseError, Permissions, SessionCredential, Snowflake,
    SnowflakeParseError, VerificationCode,
};
