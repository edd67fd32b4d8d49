//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in verify-core.

mod audit_log;
mod error;
mod link;
mod lock;
mod pending;
mod server_config;

pub use audit_log::PgAuditLogRepository;
pub use link::PgVerifiedLinkRepository;
pub use pending::PgPendingVerificationRepository;
pub use server_config::PgServerPolicyRepository;
