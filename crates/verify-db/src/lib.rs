//! # verify-db
//!
//! Database layer implementing the verify-core repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! - Connection pool management and schema bootstrap
//! - Database models with SQLx `FromRow` derives
//! - Model → entity mappers
//! - Repository implementations; delete-then-insert replacements run in a
//!   transaction holding a per-key advisory lock
//!
//! ## Usage
//!
//! ```rust,ignore
//! use verify_db::{create_pool, ensure_schema, DatabaseConfig, PgPendingVerificationRepository};
//!
//! async fn example(config: &verify_common::AppConfig) -> Result<(), sqlx::Error> {
//!     let pool = create_pool(&DatabaseConfig::from(&config.database)).await?;
//!     ensure_schema(&pool).await?;
//!     let pending_repo = PgPendingVerificationRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, ensure_schema, DatabaseConfig, PgPool, SCHEMA};
pub use repositories::{
    PgAuditLogRepository, PgPendingVerificationRepository, PgServerPolicyRepository,
    PgVerifiedLinkRepository,
};
