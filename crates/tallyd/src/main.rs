//! tallyd - The tally background service
//!
//! Loads configuration, sets up logging and serves chat transports over a
//! Unix socket until a termination signal arrives.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tally_config::load_config_or_default;
use tally_util::default_config_path;
use tallyd::Service;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// tallyd - Shared expense settlement service
#[derive(Parser, Debug)]
#[command(name = "tallyd")]
#[command(about = "Shared expense settlement service", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/tally/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set TALLY_SOCKET env var)
    #[arg(short, long, env = "TALLY_SOCKET")]
    socket: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Termination signals that end the service
struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
    sighup: Signal,
}

impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate())
                .context("Failed to create SIGTERM handler")?,
            sigint: signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?,
            sighup: signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?,
        })
    }

    async fn recv(mut self) {
        let name = tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
            _ = self.sighup.recv() => "SIGHUP",
        };
        info!(signal = name, "Received signal, shutting down gracefully");
    }
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

    info!(version = env!("CARGO_PKG_VERSION"), "tallyd starting");

    let settings = load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    info!(
        config_path = %args.config.display(),
        min_participants = settings.settlement.min_participants,
        max_participants = ?settings.settlement.max_participants,
        "Configuration loaded"
    );

    let socket_path = args
        .socket
        .clone()
        .unwrap_or_else(|| settings.service.socket_path.clone());

    let signals = ShutdownSignals::install()?;
    let service = Service::new(settings.settlement, &socket_path).await?;
    service.run(signals.recv()).await
}
