//! podping
//!
//! Probes every pod in the cluster with ICMP echo requests and exposes the
//! latency and loss as Prometheus summaries.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐   snapshot   ┌───────────┐  spawn/retain  ┌──────────────┐
//!   │  inventory   │─────────────▶│ discovery │───────────────▶│ prober fleet │
//!   │ (k8s / file) │              │   loop    │                │ 1 task/target│
//!   └──────────────┘              └───────────┘                └──────┬───────┘
//!                                                                     │ Sample
//!                                                                     ▼
//!   ┌──────────────┐    GET /metrics    ┌──────────────┐       ┌──────────────┐
//!   │  Prometheus  │───────────────────▶│ http server  │◀──────│ metrics sink │
//!   └──────────────┘                    └──────────────┘       └──────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use podping::config::{load_config, validate_config, ConfigError, DiscoveryMode, PingerConfig};
use podping::lifecycle::{signals, startup, Shutdown};
use podping::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "podping", version, about = "Cluster-wide ICMP latency prober", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// The address to listen on for HTTP requests (overrides config file)
    #[arg(long)]
    listen_address: Option<String>,

    /// Discover targets once at startup instead of polling
    #[arg(long)]
    once: bool,
}

fn load(cli: &Cli) -> Result<PingerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PingerConfig::default(),
    };

    if let Some(addr) = &cli.listen_address {
        config.server.listen_address = addr.clone();
    }
    if cli.once {
        config.discovery.mode = DiscoveryMode::Once;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_address = %config.server.listen_address,
        inventory = ?config.inventory.kind,
        discovery_mode = ?config.discovery.mode,
        probe_interval_secs = config.probe.interval_secs,
        "podping starting"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    if let Err(e) = startup::run(config, shutdown).await {
        tracing::error!(error = %e, severity = ?e.severity(), "podping terminated");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
