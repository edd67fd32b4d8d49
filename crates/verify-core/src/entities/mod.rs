//! Domain entities - core business objects

mod audit;
mod link;
mod member;
mod pending;
mod policy;

pub use audit::{AuditEntry, AuditStatus, NewAuditEntry};
pub use link::{ExternalAccount, VerifiedLink};
pub use member::Member;
pub use pending::{PendingVerification, VERIFICATION_TTL_MINUTES};
pub use policy::{ServerPolicy, ServerPolicyPatch, VerificationRole};
