//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the sink, inventory source and pinger from configuration
//! - Bind the metrics listener
//! - Run the HTTP server and the discovery loop until shutdown
//! - Stop every prober before returning
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener is bound before discovery so a bad address fails early
//! - Metrics upkeep runs on its own task so stale series expire even when
//!   nobody scrapes

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::{parse_listen_address, ConfigError, PingerConfig, ProbeConfig};
use crate::discovery::{DiscoveryLoop, ProberFleet};
use crate::error::Error;
use crate::http::{AppState, MetricsServer};
use crate::inventory::{self, InventorySource};
use crate::lifecycle::Shutdown;
use crate::observability::PrometheusSink;
use crate::probe::{IcmpPinger, Pinger};

/// Period of the metrics upkeep task.
pub const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Probe cycles a target may miss before its series expire.
const IDLE_CYCLES: u32 = 10;

/// How long a target's series outlive its last sample.
pub fn series_idle_timeout(probe: &ProbeConfig) -> Duration {
    let cycle = Duration::from_secs(probe.interval_secs + probe.timeout_secs);
    (cycle * IDLE_CYCLES).max(Duration::from_secs(60))
}

/// Build everything from `config` and run until `shutdown` fires.
pub async fn run(config: PingerConfig, shutdown: Shutdown) -> Result<(), Error> {
    let sink = Arc::new(PrometheusSink::with_idle_timeout(series_idle_timeout(
        &config.probe,
    ))?);
    let source = inventory::from_config(&config.inventory)?;
    let pinger: Arc<dyn Pinger> = Arc::new(IcmpPinger::from_config(&config.probe));

    let addr = parse_listen_address(&config.server.listen_address)
        .map_err(|e| ConfigError::Validation(vec![e]))?;
    let listener = TcpListener::bind(addr).await.map_err(Error::Listener)?;

    run_with(config, source, pinger, sink, listener, shutdown).await
}

/// Run with already constructed collaborators.
pub async fn run_with(
    config: PingerConfig,
    source: Arc<dyn InventorySource>,
    pinger: Arc<dyn Pinger>,
    sink: Arc<PrometheusSink>,
    listener: TcpListener,
    shutdown: Shutdown,
) -> Result<(), Error> {
    let fleet = Arc::new(ProberFleet::new(
        pinger,
        sink.clone(),
        Duration::from_secs(config.probe.interval_secs),
        shutdown.token(),
    ));

    let upkeep_task = tokio::spawn(run_upkeep(sink.clone(), shutdown.token()));

    let server = MetricsServer::new(AppState {
        metrics: sink.handle(),
        fleet: fleet.clone(),
    });
    let mut server_task: JoinHandle<Result<(), std::io::Error>> =
        tokio::spawn(server.run(listener, shutdown.token()));

    let discovery = DiscoveryLoop::new(source, fleet.clone(), config.discovery.clone());
    let discovery_token = shutdown.token();
    let wait_shutdown = shutdown.clone();
    let discover = async move {
        discovery.run(discovery_token).await?;
        wait_shutdown.wait().await;
        Ok::<(), Error>(())
    };

    let mut server_done = false;
    let result = tokio::select! {
        result = discover => result,
        joined = &mut server_task => {
            server_done = true;
            flatten_server_result(joined)
        }
    };

    shutdown.trigger();
    fleet.shutdown().await;

    if !server_done {
        if let Err(e) = flatten_server_result(server_task.await) {
            tracing::warn!(error = %e, "Metrics server exited with error");
        }
    }

    if let Err(e) = upkeep_task.await {
        tracing::warn!(error = %e, "Metrics upkeep task ended abnormally");
    }

    result
}

/// Run metrics upkeep every [`UPKEEP_INTERVAL`] until `shutdown` is cancelled.
pub async fn run_upkeep(sink: Arc<PrometheusSink>, shutdown: CancellationToken) {
    let mut ticker = time::interval(UPKEEP_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => sink.run_upkeep(),
            _ = shutdown.cancelled() => break,
        }
    }
}


fn flatten_server_result(
    joined: Result<Result<(), std::io::Error>, tokio::task::JoinError>,
) -> Result<(), Error> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Error::Listener(e)),
        Err(e) => Err(Error::Listener(std::io::Error::other(e))),
    }
}
