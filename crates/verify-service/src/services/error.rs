//! Service layer error type

use thiserror::Error;
use verify_core::{DomainError, UpstreamError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The acting member lacks a server permission
    #[error("Missing required permission: {permission}")]
    PermissionDenied { permission: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ServiceError {
    pub fn permission_denied(permission: impl Into<String>) -> Self {
        Self::PermissionDenied {
            permission: permission.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// An upstream call failed in a way retrying later may fix
    pub fn upstream(context: &str, err: &UpstreamError) -> Self {
        Self::Domain(DomainError::UpstreamUnavailable(format!("{context}: {err}")))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_transient())
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_expired())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Domain(e) => e.status_code(),
            Self::PermissionDenied { .. } => 403,
            Self::Validation(_) => 400,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Domain(e) => e.code(),
            Self::PermissionDenied { .. } => "MISSING_PERMISSIONS",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
