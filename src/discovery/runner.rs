//! Discovery loop.
//!
//! # Responsibilities
//! - Periodically fetch the inventory
//! - Start a prober for each target outside the host network namespace
//! - Stop probers for targets that disappeared
//!
//! An inventory failure ends the loop with an error: without a trustworthy
//! inventory there is nothing safe to probe.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::{DiscoveryConfig, DiscoveryMode};
use crate::discovery::fleet::ProberFleet;
use crate::error::Error;
use crate::inventory::{InventorySnapshot, InventorySource};
use crate::probe::Target;

/// Outcome of one discovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Entries in the snapshot.
    pub observed: usize,
    /// Entries sharing the host network namespace.
    pub skipped_local: usize,
    pub spawned: usize,
    pub already_running: usize,
    pub pruned: usize,
}

/// Targets for every entry that does not share the host network namespace,
/// in snapshot order.
pub fn select_targets(snapshot: &InventorySnapshot) -> Vec<Target> {
    snapshot
        .entries
        .iter()
        .filter(|entry| !entry.host_network)
        .map(|entry| Target::new(entry.name.clone(), entry.address.clone()))
        .collect()
}

pub struct DiscoveryLoop {
    source: Arc<dyn InventorySource>,
    fleet: Arc<ProberFleet>,
    config: DiscoveryConfig,
}

impl DiscoveryLoop {
    pub fn new(
        source: Arc<dyn InventorySource>,
        fleet: Arc<ProberFleet>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            source,
            fleet,
            config,
        }
    }

    /// Fetch one snapshot and reconcile the fleet against it.
    pub async fn run_cycle(&self) -> Result<CycleReport, Error> {
        let snapshot = self.source.snapshot().await?;
        let targets = select_targets(&snapshot);

        let mut report = CycleReport {
            observed: snapshot.len(),
            skipped_local: snapshot.len() - targets.len(),
            ..Default::default()
        };

        for target in &targets {
            if self.fleet.spawn(target.clone()) {
                report.spawned += 1;
            } else {
                report.already_running += 1;
            }
        }

        if self.config.prune_missing {
            let live: HashSet<Target> = targets.into_iter().collect();
            report.pruned = self.fleet.retain(&live);
        }

        Ok(report)
    }

    /// Run until cancelled (poll mode) or after one pass (once mode).
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), Error> {
        tracing::info!(
            source = %self.source.describe(),
            mode = ?self.config.mode,
            interval_secs = self.config.interval_secs,
            "Discovery starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.cancelled() => break,
            }

            let report = tokio::select! {
                result = self.run_cycle() => result,
                _ = shutdown.cancelled() => break,
            };

            match report {
                Ok(report) => {
                    tracing::info!(
                        observed = report.observed,
                        skipped_local = report.skipped_local,
                        spawned = report.spawned,
                        already_running = report.already_running,
                        pruned = report.pruned,
                        active = self.fleet.len(),
                        "Discovery cycle complete"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "Inventory fetch failed");
                    return Err(e);
                }
            }

            if self.config.mode == DiscoveryMode::Once {
                tracing::info!("Single discovery pass complete");
                break;
            }
        }

        Ok(())
    }
}
