//! Verification engine and dispatcher-facing services
//!
//! The engine pieces (`ConfigResolver`, `CodeIssuer`, `ProfileScanner`,
//! `VerificationCompleter`, `AuditLogger`) are composed by
//! `VerificationService` and `AdminService`.

pub mod admin;
pub mod audit;
pub mod completer;
pub mod config_resolver;
pub mod context;
pub mod error;
pub mod issuer;
pub mod scanner;
pub mod verification;

// Re-export all services for convenience
pub use admin::AdminService;
pub use audit::AuditLogger;
pub use completer::{CompletionReport, VerificationCompleter};
pub use config_resolver::ConfigResolver;
pub use context::{ScanConfig, ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use issuer::CodeIssuer;
pub use scanner::{FetchStrategy, ProfileScanner, ScanOutcome};
pub use verification::VerificationService;
