//! Aster webhook relay - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Webhook-to-Aster order relay
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via ASTER_CONFIG env var)
    #[arg(short, long, env = "ASTER_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    aster_telemetry::init_logging()?;

    info!("Starting aster-relay v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args
        .config
        .unwrap_or_else(|| aster_relay::config::DEFAULT_CONFIG_PATH.to_string());
    info!(config_path = %config_path, "Loading configuration");

    let config = aster_relay::AppConfig::load(Some(config_path.as_str()))?;
    info!(scheme = %config.scheme, port = config.port, "Configuration loaded");

    let app = aster_relay::Application::new(config)?;
    app.run().await?;

    Ok(())
}
