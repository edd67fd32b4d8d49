//! Data transfer objects for dispatcher requests and responses
//!
//! This module provides:
//! - Request DTOs with validation for trigger inputs
//! - Response DTOs for serializing outcomes
//! - Mappers for converting domain entities to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{
    AddRoleRequest, CheckVerificationRequest, RecentLogsQuery, SetupRequest,
    StartVerificationRequest, UpdateConfigRequest,
};

pub use responses::{
    AuditEntryResponse, CheckVerificationResponse, CompletionResponse,
    ExternalAccountResponse, HealthResponse, LinkResponse, PendingResponse, PolicyResponse,
    ResetResponse, RoleChangeResponse, RoleResponse, StartVerificationResponse, StatusResponse,
};
