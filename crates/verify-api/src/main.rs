//! Trigger API entry point
//!
//! Run with:
//! ```bash
//! cargo run -p verify-api
//! ```
//!
//! Configuration is loaded from environment variables (and `.env` when present).

use anyhow::Context;
use tracing::{error, info};
use verify_common::{try_init_tracing_with_config, AppConfig, TracingConfig};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = format!("{e:#}"), "Trigger API stopped");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("loading configuration")?;

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: {e}");
    }

    info!(
        name = %config.app.name,
        env = ?config.app.env,
        port = config.api.port,
        "Configuration loaded"
    );

    verify_api::run(config).await.context("running trigger API")
}
