//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set. Otherwise the configured level applies to the
//! bot's own crates while sqlx statement logging and the HTTP client stack
//! stay at `warn`.

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::Environment;

/// Dependencies that are noisy below `warn`
const QUIET_TARGETS: [&str; 4] = ["sqlx", "hyper", "hyper_util", "reqwest"];

/// How log lines are produced
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for this workspace's crates when `RUST_LOG` is unset
    pub level: Level,
    /// One JSON object per line instead of human-readable text
    pub json: bool,
    /// Emit span open/close events, useful for timing scans locally
    pub span_events: bool,
    pub file_line: bool,
}

impl TracingConfig {
    #[must_use]
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self {
                level: Level::DEBUG,
                json: false,
                span_events: true,
                file_line: true,
            },
            Environment::Staging => Self {
                level: Level::DEBUG,
                json: true,
                span_events: false,
                file_line: false,
            },
            Environment::Production => Self {
                level: Level::INFO,
                json: true,
                span_events: false,
                file_line: false,
            },
        }
    }

    /// Filter directives used when `RUST_LOG` is unset
    fn default_directives(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        QUIET_TARGETS
            .iter()
            .fold(level, |acc, target| format!("{acc},{target}=warn"))
    }
}

/// Install the global subscriber; fails instead of panicking if one is already set
pub fn try_init_tracing_with_config(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let fmt_layer = fmt::layer()
        .with_file(config.file_line)
        .with_line_number(config.file_line)
        .with_span_events(span_events);

    let fmt_layer = if config.json {
        fmt_layer.json().boxed()
    } else {
        fmt_layer.boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|_| TracingError::AlreadyInitialized)
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Tracing subscriber already initialized")]
    AlreadyInitialized,
}
