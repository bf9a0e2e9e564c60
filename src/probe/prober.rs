//! Per-target probe loop.
//!
//! # Responsibilities
//! - Probe one target at a fixed cadence for as long as it is wanted
//! - Publish a sample per completed session
//! - Survive every per-target failure

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::observability::metrics::SampleSink;
use crate::probe::{Pinger, ProbeError, Sample, Target};

/// Default delay between two probes of the same target.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);

/// Probe loop for a single target.
pub struct Prober {
    target: Target,
    pinger: Arc<dyn Pinger>,
    sink: Arc<dyn SampleSink>,
    interval: Duration,
}

impl Prober {
    pub fn new(target: Target, pinger: Arc<dyn Pinger>, sink: Arc<dyn SampleSink>) -> Self {
        Self {
            target,
            pinger,
            sink,
            interval: DEFAULT_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run one session and publish its sample.
    pub async fn probe_once(&self) -> Result<Sample, ProbeError> {
        let stats = self.pinger.ping(&self.target).await?;
        let sample = Sample::new(self.target.clone(), stats);
        self.sink.record(&sample);
        Ok(sample)
    }

    /// Probe until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            name = %self.target.name,
            address = %self.target.address,
            interval = ?self.interval,
            "Prober starting"
        );

        while !shutdown.is_cancelled() {
            let outcome = tokio::select! {
                outcome = self.probe_once() => outcome,
                _ = shutdown.cancelled() => break,
            };

            match outcome {
                Ok(sample) => {
                    tracing::debug!(
                        name = %self.target.name,
                        address = %self.target.address,
                        min_rtt = ?sample.min_rtt,
                        max_rtt = ?sample.max_rtt,
                        sent = sample.sent,
                        recv = sample.recv,
                        loss = sample.loss,
                        "Probe complete"
                    );
                }
                Err(e) => {
                    self.sink.record_failure(&self.target, e.reason());
                    tracing::warn!(
                        name = %self.target.name,
                        address = %self.target.address,
                        error = %e,
                        "Probe failed"
                    );
                }
            }

            tokio::select! {
                _ = time::sleep(self.interval) => {}
                _ = shutdown.cancelled() => break,
            }
        }

        tracing::info!(name = %self.target.name, address = %self.target.address, "Prober stopped");
    }
}
