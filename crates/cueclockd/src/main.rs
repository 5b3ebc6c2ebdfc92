//! cueclockd - table billing service for snooker and pool halls
//!
//! Entry point: parses arguments, initializes logging, loads configuration
//! and runs the service until a termination signal arrives.

use anyhow::{Context, Result};
use clap::Parser;
use cueclock_config::{TrackerConfig, default_config, load_config};
use cueclock_util::default_config_path;
use cueclockd::Service;
use std::path::{Path, PathBuf};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// cueclockd - Table session billing service
#[derive(Parser, Debug)]
#[command(name = "cueclockd")]
#[command(about = "Table session billing service for snooker and pool halls", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/cueclock/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set CUECLOCK_SOCKET env var)
    #[arg(short, long, env = "CUECLOCK_SOCKET")]
    socket: Option<PathBuf>,

    /// Data directory override (or set CUECLOCK_DATA_DIR env var)
    #[arg(short, long, env = "CUECLOCK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn load_or_default(path: &Path) -> Result<TrackerConfig> {
    if !path.exists() {
        warn!(config_path = %path.display(), "Config file not found, using built-in tables");
        return Ok(default_config());
    }

    let config = load_config(path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;

    info!(
        config_path = %path.display(),
        categories = config.categories.len(),
        tables = config.table_count(),
        "Configuration loaded"
    );

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "cueclockd starting");

    let config = load_or_default(&args.config)?;

    let socket_path = args
        .socket
        .clone()
        .unwrap_or_else(|| config.service.socket_path.clone());
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| config.service.data_dir.clone());

    let service = Service::new(config, &socket_path, &data_dir).await?;

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

    service
        .run(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
                // Sent when the controlling terminal goes away
                _ = sighup.recv() => info!("Received SIGHUP, shutting down gracefully"),
            }
        })
        .await
}
