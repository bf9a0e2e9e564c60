//! Running prober tasks, keyed by target.
//!
//! # Responsibilities
//! - Start at most one prober per target
//! - Cancel probers for targets that left the inventory
//! - Report running targets for the HTTP API
//! - Cancel and join every prober on shutdown

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::observability::metrics::SampleSink;
use crate::probe::{Pinger, Prober, Target};

#[derive(Debug)]
struct ProberHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
    started_at: DateTime<Utc>,
}

/// A running prober as reported by `/targets`.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveTarget {
    pub name: String,
    pub address: String,
    pub started_at: DateTime<Utc>,
}

/// Set of prober tasks sharing one pinger and one sink.
pub struct ProberFleet {
    probers: DashMap<Target, ProberHandle>,
    pinger: Arc<dyn Pinger>,
    sink: Arc<dyn SampleSink>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ProberFleet {
    /// Prober tokens are children of `shutdown`.
    pub fn new(
        pinger: Arc<dyn Pinger>,
        sink: Arc<dyn SampleSink>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            probers: DashMap::new(),
            pinger,
            sink,
            interval,
            shutdown,
        }
    }

    fn launch(&self, target: Target) -> ProberHandle {
        let token = self.shutdown.child_token();
        let prober = Prober::new(target, self.pinger.clone(), self.sink.clone())
            .with_interval(self.interval);
        let task = tokio::spawn(prober.run(token.clone()));

        ProberHandle {
            token,
            task,
            started_at: Utc::now(),
        }
    }

    /// Start probing `target` unless a live prober already exists for it.
    ///
    /// A prober whose task has ended (panicked) is replaced. Returns whether
    /// a new task was started.
    pub fn spawn(&self, target: Target) -> bool {
        if self.shutdown.is_cancelled() {
            return false;
        }

        // The entry guard must be gone before `report` takes shard locks.
        let started = match self.probers.entry(target) {
            Entry::Occupied(mut existing) => {
                if existing.get().task.is_finished() {
                    tracing::warn!(
                        name = %existing.key().name,
                        address = %existing.key().address,
                        "Prober exited unexpectedly, restarting"
                    );
                    let handle = self.launch(existing.key().clone());
                    existing.insert(handle);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(slot) => {
                let handle = self.launch(slot.key().clone());
                slot.insert(handle);
                true
            }
        };

        if started {
            self.report();
        }
        started
    }

    /// Cancel probers whose target is not in `live`. Returns how many stopped.
    pub fn retain(&self, live: &HashSet<Target>) -> usize {
        let mut pruned = 0;
        self.probers.retain(|target, handle| {
            if live.contains(target) {
                return true;
            }
            tracing::info!(name = %target.name, address = %target.address, "Target gone, stopping prober");
            handle.token.cancel();
            pruned += 1;
            false
        });

        if pruned > 0 {
            self.report();
        }
        pruned
    }

    pub fn contains(&self, target: &Target) -> bool {
        self.probers.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.probers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probers.is_empty()
    }

    /// Running targets, sorted by name then address.
    pub fn targets(&self) -> Vec<ActiveTarget> {
        let mut targets: Vec<ActiveTarget> = self
            .probers
            .iter()
            .map(|entry| ActiveTarget {
                name: entry.key().name.clone(),
                address: entry.key().address.clone(),
                started_at: entry.value().started_at,
            })
            .collect();
        targets.sort_by(|a, b| (&a.name, &a.address).cmp(&(&b.name, &b.address)));
        targets
    }

    /// Cancel every prober and wait for all of them to finish.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let targets: Vec<Target> = self.probers.iter().map(|e| e.key().clone()).collect();
        for target in targets {
            if let Some((_, handle)) = self.probers.remove(&target) {
                if let Err(e) = handle.task.await {
                    tracing::warn!(name = %target.name, error = %e, "Prober task ended abnormally");
                }
            }
        }

        self.report();
        tracing::info!("All probers stopped");
    }

    fn report(&self) {
        self.sink.set_active_probers(self.probers.len());
    }
}

impl std::fmt::Debug for ProberFleet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProberFleet")
            .field("probers", &self.probers.len())
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{ProbeError, ProbeStats, Sample};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ReplyPinger;

    #[async_trait]
    impl Pinger for ReplyPinger {
        async fn ping(&self, _target: &Target) -> Result<ProbeStats, ProbeError> {
            Ok(ProbeStats::replied(Duration::from_millis(1)))
        }
    }

    #[derive(Default)]
    struct GaugeSink {
        active: AtomicUsize,
    }

    impl SampleSink for GaugeSink {
        fn record(&self, _sample: &Sample) {}

        fn set_active_probers(&self, count: usize) {
            self.active.store(count, Ordering::SeqCst);
        }
    }

    fn fleet(sink: Arc<GaugeSink>) -> ProberFleet {
        ProberFleet::new(
            Arc::new(ReplyPinger),
            sink,
            Duration::from_millis(20),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_spawn_is_deduplicated() {
        let sink = Arc::new(GaugeSink::default());
        let fleet = fleet(sink.clone());
        let a = Target::new("a", "10.0.0.1");

        assert!(fleet.spawn(a.clone()));
        assert!(!fleet.spawn(a.clone()));
        assert!(fleet.spawn(Target::new("a", "10.0.0.9")));
        assert_eq!(fleet.len(), 2);
        assert_eq!(sink.active.load(Ordering::SeqCst), 2);

        fleet.shutdown().await;
        assert!(fleet.is_empty());
        assert_eq!(sink.active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retain_prunes_missing() {
        let sink = Arc::new(GaugeSink::default());
        let fleet = fleet(sink.clone());
        let a = Target::new("a", "10.0.0.1");
        let b = Target::new("b", "10.0.0.2");
        fleet.spawn(a.clone());
        fleet.spawn(b.clone());

        let live: HashSet<Target> = [a.clone()].into_iter().collect();
        assert_eq!(fleet.retain(&live), 1);
        assert!(fleet.contains(&a));
        assert!(!fleet.contains(&b));
        assert_eq!(sink.active.load(Ordering::SeqCst), 1);

        fleet.shutdown().await;
    }

    #[tokio::test]
    async fn test_no_spawn_after_shutdown() {
        let fleet = fleet(Arc::new(GaugeSink::default()));
        fleet.shutdown().await;
        assert!(!fleet.spawn(Target::new("a", "10.0.0.1")));
        assert!(fleet.is_empty());
    }

    #[tokio::test]
    async fn test_targets_sorted() {
        let fleet = fleet(Arc::new(GaugeSink::default()));
        fleet.spawn(Target::new("b", "10.0.0.2"));
        fleet.spawn(Target::new("a", "10.0.0.1"));

        let names: Vec<String> = fleet.targets().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["a", "b"]);

        fleet.shutdown().await;
    }
}
