//! BeanBack node binary
//!
//! Opens the ledger and settlement engine and runs until interrupted.

use anyhow::Context;
use beanback_settlement::{Config, LogFormat, SettlementEngine};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::var("BEANBACK_CONFIG").ok();
    let config = match &config_path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::from_env().context("Failed to load config from environment")?,
    };

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init(),
    }

    info!(
        service = %config.service_name,
        version = %config.service_version,
        config = config_path.as_deref().unwrap_or("<env>"),
        "Starting BeanBack node"
    );

    let engine = SettlementEngine::new(config)
        .await
        .context("Failed to start settlement engine")?;

    info!(
        data_dir = %engine.config().ledger.data_dir.display(),
        merchants = engine.merchants().len(),
        "Node ready"
    );

    signal::ctrl_c().await?;

    info!("Shutting down BeanBack node");
    engine.shutdown().await?;
    Ok(())
}
