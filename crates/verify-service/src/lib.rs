//! # verify-service
//!
//! Application layer: the verification engine (config resolution, code
//! issuance, profile scanning, completion, audit) and the operations the
//! command dispatcher triggers.

pub mod dto;
pub mod services;

pub use services::{
    AdminService, AuditLogger, CodeIssuer, CompletionReport, ConfigResolver, ProfileScanner,
    ScanConfig, ScanOutcome, ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult,
    VerificationCompleter, VerificationService,
};
