//! Application configuration structs
//!
//! Loads configuration from environment variables (optionally via a `.env` file).

use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub trigger: TriggerConfig,
    pub database: DatabaseConfig,
    pub discord: DiscordConfig,
    pub identity: IdentityConfig,
    pub scan: ScanSettings,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Trigger API bind address
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared secret the command dispatcher presents as a bearer token
#[derive(Clone)]
pub struct TriggerConfig {
    pub token: String,
}

impl fmt::Debug for TriggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerConfig").field("token", &"<redacted>").finish()
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Chat platform REST client configuration
#[derive(Clone)]
pub struct DiscordConfig {
    pub token: String,
    pub api_base: String,
}

impl fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// External identity directory endpoints and limits
#[derive(Clone)]
pub struct IdentityConfig {
    pub users_api: String,
    pub web_base: String,
    pub friends_api: String,
    /// Optional session cookie for authenticated profile fetches
    pub session_cookie: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("users_api", &self.users_api)
            .field("web_base", &self.web_base)
            .field("friends_api", &self.friends_api)
            .field("session_cookie", &self.session_cookie.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Profile scan limits
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScanSettings {
    /// Deadline for one whole scan
    #[serde(default = "default_scan_timeout")]
    pub timeout_secs: u64,
    /// Candidates checked at once
    #[serde(default = "default_scan_concurrency")]
    pub concurrency: usize,
    /// Cap on fuzzy search results
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_scan_timeout(),
            concurrency: default_scan_concurrency(),
            search_limit: default_search_limit(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "verify-bot".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_discord_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_users_api() -> String {
    "https://users.roblox.com".to_string()
}

fn default_web_base() -> String {
    "https://www.roblox.com".to_string()
}

fn default_friends_api() -> String {
    "https://friends.roblox.com".to_string()
}

fn default_request_timeout() -> u64 {
    8
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_scan_timeout() -> u64 {
    25
}

fn default_scan_concurrency() -> usize {
    1
}

fn default_search_limit() -> u32 {
    10
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingVar(key))
        };

        let scan = ScanSettings {
            timeout_secs: parse_or(&get, "SCAN_TIMEOUT_SECS", default_scan_timeout)?,
            concurrency: parse_or(&get, "SCAN_CONCURRENCY", default_scan_concurrency)?,
            search_limit: parse_or(&get, "SEARCH_LIMIT", default_search_limit)?,
        };
        if scan.concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "SCAN_CONCURRENCY",
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            app: AppSettings {
                name: get("APP_NAME").unwrap_or_else(default_app_name),
                env: get("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            api: ServerConfig {
                host: get("API_HOST").unwrap_or_else(default_host),
                port: required("API_PORT")?
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("API_PORT", "not a port".to_string()))?,
            },
            trigger: TriggerConfig {
                token: required("TRIGGER_TOKEN")?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", default_max_connections)?,
                min_connections: parse_or(&get, "DATABASE_MIN_CONNECTIONS", default_min_connections)?,
            },
            discord: DiscordConfig {
                token: required("DISCORD_TOKEN")?,
                api_base: get("DISCORD_API_BASE").unwrap_or_else(default_discord_api_base),
            },
            identity: IdentityConfig {
                users_api: get("ROBLOX_USERS_API").unwrap_or_else(default_users_api),
                web_base: get("ROBLOX_WEB_BASE").unwrap_or_else(default_web_base),
                friends_api: get("ROBLOX_FRIENDS_API").unwrap_or_else(default_friends_api),
                session_cookie: get("ROBLOX_COOKIE").filter(|v| !v.trim().is_empty()),
                request_timeout_secs: parse_or(&get, "UPSTREAM_TIMEOUT_SECS", default_request_timeout)?,
                connect_timeout_secs: parse_or(
                    &get,
                    "UPSTREAM_CONNECT_TIMEOUT_SECS",
                    default_connect_timeout,
                )?,
            },
            scan,
        })
    }
}

fn parse_or<F, T>(get: &F, key: &'static str, default: fn() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default()),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
