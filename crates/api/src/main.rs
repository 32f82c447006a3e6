//! Image Classifier - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("failed to load configuration")?;
    init_logging(&config.log_level, config.log_json);

    info!("=== Image Classifier v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Loading model before accepting traffic...");

    // Any startup failure, including model load or warm-up, exits non-zero
    run_server(config).await.context("server failed")?;

    Ok(())
}
