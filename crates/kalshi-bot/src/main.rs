//! Kalshi live arbitrage monitor - entry point.

use anyhow::Result;
use clap::Parser;
use kalshi_bot::config::Credentials;
use tracing::info;

/// Kalshi live arbitrage monitor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via KALSHI_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any WS connections)
    kalshi_ws::init_crypto();

    let args = Args::parse();

    kalshi_telemetry::init_logging()?;

    info!("Starting kalshi-bot v{}", env!("CARGO_PKG_VERSION"));

    // Determine config path: CLI arg > KALSHI_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("KALSHI_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = kalshi_bot::AppConfig::load(&config_path)?;
    info!(
        top_events = config.top_events,
        auto_execute = config.auto_execute,
        "Configuration loaded"
    );

    let credentials = Credentials::from_env()?;

    let app = kalshi_bot::Application::new(config, credentials)?;
    app.run().await?;

    Ok(())
}
