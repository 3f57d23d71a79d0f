//! Netflow Scalper - Main Entry Point
//!
//! Streams trades and depth for one symbol, runs the net-volume decision
//! engine and forwards its orders to the configured execution adapter.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use netflow_scalper::config::load_config;
use netflow_scalper::config::types::ExecutionMode;
use netflow_scalper::TradingSystem;

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "APP_CONFIG")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides settings.log_level
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Symbol to trade, e.g. suiusdt
    #[arg(long)]
    symbol: Option<String>,

    /// Force the log-only execution adapter
    #[arg(long)]
    dry_run: bool,
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.with_file(true).with_line_number(true).try_init()
    };
    installed.map_err(|e| anyhow::anyhow!(e))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let mut config = load_config(Some(&args.config))?;
    if let Some(symbol) = &args.symbol {
        config.feed.symbol = symbol.to_lowercase();
        config.execution.rest.symbol = symbol.to_uppercase();
    }
    if args.dry_run {
        config.execution.mode = ExecutionMode::DryRun;
    }
    config.validate()?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.settings.log_level.clone());
    init_logging(&level, args.log_json)?;

    info!("Starting netflow scalper");
    info!("Configuration file: {}", args.config);

    TradingSystem::new(config).run().await?;

    info!("Shutdown complete");
    Ok(())
}
