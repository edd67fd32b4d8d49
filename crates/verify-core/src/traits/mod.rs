//! Ports - interfaces the domain needs from infrastructure

mod platform;
mod repositories;

pub use platform::{ChatPlatform, IdentityDirectory, Notice, UpstreamError, UpstreamResult};
pub use repositories::{
    AuditLogRepository, PendingVerificationRepository, RepoResult, ServerPolicyRepository,
    VerifiedLinkRepository,
};
