//! Database models - SQLx-compatible structs for PostgreSQL tables

mod audit_log;
mod link;
mod pending;
mod server_config;

pub use audit_log::AuditLogModel;
pub use link::VerifiedLinkModel;
pub use pending::PendingVerificationModel;
pub use server_config::{ServerConfigModel, VerificationRoleModel};
