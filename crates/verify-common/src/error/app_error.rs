//! Process-level errors
//!
//! Everything that can stop the binary before or while it serves: bad
//! configuration, an unreachable database, a port that cannot be bound.
//! Request-level failures never reach this type.

use std::net::SocketAddr;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid startup wiring: {0}")]
    Wiring(String),

    #[error("Database unavailable: {0}")]
    Database(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

impl AppError {
    pub fn database(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }

    pub fn wiring(err: impl std::fmt::Display) -> Self {
        Self::Wiring(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
