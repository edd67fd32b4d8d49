//! Path parameter extractors
//!
//! Type-safe extraction of Snowflake IDs from path parameters.

use serde::Deserialize;
use verify_core::Snowflake;

use crate::response::ApiError;

fn parse_id(raw: &str, name: &str) -> Result<Snowflake, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::invalid_path(format!("Invalid {name} format")))
}

/// Path parameters with server_id
#[derive(Debug, Deserialize)]
pub struct ServerPath {
    pub server_id: String,
}

impl ServerPath {
    /// Parse server_id as Snowflake
    pub fn server_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.server_id, "server_id")
    }
}

/// Path parameters with server_id and user_id
#[derive(Debug, Deserialize)]
pub struct ServerUserPath {
    pub server_id: String,
    pub user_id: String,
}

impl ServerUserPath {
    /// Parse server_id as Snowflake
    pub fn server_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.server_id, "server_id")
    }

    /// Parse user_id as Snowflake
    pub fn user_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.user_id, "user_id")
    }
}

/// Path parameters with server_id and role_id
#[derive(Debug, Deserialize)]
pub struct ServerRolePath {
    pub server_id: String,
    pub role_id: String,
}

impl ServerRolePath {
    /// Parse server_id as Snowflake
    pub fn server_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.server_id, "server_id")
    }

    /// Parse role_id as Snowflake
    pub fn role_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.role_id, "role_id")
    }
}
