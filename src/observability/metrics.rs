//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Accept probe samples from every prober task
//! - Expose Prometheus-compatible text for the `/metrics` endpoint
//!
//! # Metrics
//! - `ping_durations_seconds` (summary): one observation per sample and
//!   statistic, labelled `target`, `address`, `stat`
//! - `ping_probe_failures_total` (counter): session setup failures by reason
//! - `ping_active_probers` (gauge): running prober tasks
//!
//! # Design Decisions
//! - The recorder is owned by the sink, not installed globally, so several
//!   sinks can coexist in one process (tests)
//! - RTTs are observed in seconds; counts and loss are observed as-is
//! - Per-target series expire after an idle timeout, so targets that left
//!   the inventory stop being exported

use std::time::Duration;

use metrics::{Recorder, Unit};
use metrics_exporter_prometheus::{
    BuildError, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};
use metrics_util::MetricKindMask;

use crate::probe::{Sample, Target};

pub const PING_DURATIONS: &str = "ping_durations_seconds";
pub const PROBE_FAILURES: &str = "ping_probe_failures_total";
pub const ACTIVE_PROBERS: &str = "ping_active_probers";

/// Summary quantiles exported for `ping_durations_seconds`.
pub const QUANTILES: [f64; 3] = [0.5, 0.9, 0.99];

/// Idle timeout used by [`PrometheusSink::new`].
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Destination for probe results.
///
/// Implementations must tolerate concurrent calls from many prober tasks.
pub trait SampleSink: Send + Sync + 'static {
    /// Publish one probe cycle.
    fn record(&self, sample: &Sample);

    /// Count a probe session that could not be set up.
    fn record_failure(&self, _target: &Target, _reason: &'static str) {}

    /// Report how many prober tasks are running.
    fn set_active_probers(&self, _count: usize) {}
}

/// Sink rendering samples in the Prometheus exposition format.
pub struct PrometheusSink {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl PrometheusSink {
    pub fn new() -> Result<Self, BuildError> {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    /// Per-target series not updated within `idle_timeout` are dropped.
    ///
    /// The active prober gauge is exempt.
    pub fn with_idle_timeout(idle_timeout: Duration) -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_quantiles(&QUANTILES)?
            .idle_timeout(
                MetricKindMask::HISTOGRAM | MetricKindMask::COUNTER,
                Some(idle_timeout),
            )
            .build_recorder();
        let handle = recorder.handle();

        let sink = Self { recorder, handle };
        sink.with_recorder(|| {
            metrics::describe_histogram!(
                PING_DURATIONS,
                Unit::Seconds,
                "ping latency distributions."
            );
            metrics::describe_counter!(PROBE_FAILURES, "probe sessions that failed to start.");
            metrics::describe_gauge!(ACTIVE_PROBERS, "running prober tasks.");
        });
        Ok(sink)
    }

    /// Handle for rendering the current state.
    pub fn handle(&self) -> PrometheusHandle {
        self.handle.clone()
    }

    /// Current metrics in the text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Fold pending observations into the summaries and expire idle series.
    ///
    /// Must run periodically; without a scraper nothing else drains the
    /// recorder.
    pub fn run_upkeep(&self) {
        self.handle.run_upkeep();
        // Idle series are only evicted while rendering.
        let _ = self.handle.render();
    }

    fn with_recorder<T>(&self, f: impl FnOnce() -> T) -> T {
        let recorder: &dyn Recorder = &self.recorder;
        metrics::with_local_recorder(recorder, f)
    }
}

impl std::fmt::Debug for PrometheusSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusSink").finish_non_exhaustive()
    }
}

impl SampleSink for PrometheusSink {
    fn record(&self, sample: &Sample) {
        let observations = [
            ("min_rtt", sample.min_rtt.as_secs_f64()),
            ("max_rtt", sample.max_rtt.as_secs_f64()),
            ("packets_sent", f64::from(sample.sent)),
            ("packets_recv", f64::from(sample.recv)),
            ("packet_loss", sample.loss),
        ];

        self.with_recorder(|| {
            for (stat, value) in observations {
                metrics::histogram!(
                    PING_DURATIONS,
                    "target" => sample.target.name.clone(),
                    "address" => sample.target.address.clone(),
                    "stat" => stat
                )
                .record(value);
            }
        });
    }

    fn record_failure(&self, target: &Target, reason: &'static str) {
        self.with_recorder(|| {
            metrics::counter!(
                PROBE_FAILURES,
                "target" => target.name.clone(),
                "address" => target.address.clone(),
                "reason" => reason
            )
            .increment(1);
        });
    }

    fn set_active_probers(&self, count: usize) {
        self.with_recorder(|| {
            metrics::gauge!(ACTIVE_PROBERS).set(count as f64);
        });
    }
}
