//! Shared fakes for integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use podping::inventory::{InventoryEntry, InventoryError, InventorySnapshot, InventorySource};
use podping::observability::SampleSink;
use podping::probe::{Pinger, ProbeError, ProbeStats, Sample, Target};

/// Inventory that replays a script of snapshots, repeating the last one.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Vec<InventoryEntry>>>,
    fail: bool,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn fixed(entries: Vec<InventoryEntry>) -> Self {
        Self::sequence(vec![entries])
    }

    pub fn sequence(snapshots: Vec<Vec<InventoryEntry>>) -> Self {
        Self {
            script: Mutex::new(snapshots.into()),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventorySource for ScriptedSource {
    fn describe(&self) -> String {
        "scripted".to_string()
    }

    async fn snapshot(&self) -> Result<InventorySnapshot, InventoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(InventoryError::Credentials("simulated outage".to_string()));
        }

        let mut script = self.script.lock().unwrap();
        let entries = if script.len() > 1 {
            script.pop_front().unwrap_or_default()
        } else {
            script.front().cloned().unwrap_or_default()
        };
        Ok(InventorySnapshot::new(entries))
    }
}

/// Pinger returning the same stats for every target.
pub struct ScriptedPinger {
    stats: ProbeStats,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedPinger {
    pub fn new(stats: ProbeStats) -> Self {
        Self {
            stats,
            calls: AtomicUsize::new(0),
        }
    }

    /// `sent=1, recv=1, min=max=10ms`.
    pub fn ten_ms() -> Self {
        Self::new(ProbeStats::replied(Duration::from_millis(10)))
    }
}

#[async_trait]
impl Pinger for ScriptedPinger {
    async fn ping(&self, _target: &Target) -> Result<ProbeStats, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.stats)
    }
}

/// Sink keeping every sample in memory.
#[derive(Default)]
pub struct MemorySink {
    pub samples: Mutex<Vec<Sample>>,
}

#[allow(dead_code)]
impl MemorySink {
    pub fn samples(&self) -> Vec<Sample> {
        self.samples.lock().unwrap().clone()
    }
}

impl SampleSink for MemorySink {
    fn record(&self, sample: &Sample) {
        self.samples.lock().unwrap().push(sample.clone());
    }
}

/// Poll `condition` every 10ms for up to `timeout`.
#[allow(dead_code)]
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
