//! Probe outcomes and published samples.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::probe::Target;

/// Raw outcome of one echo session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeStats {
    pub sent: u32,
    pub recv: u32,
    pub min_rtt: Duration,
    pub max_rtt: Duration,
}

impl ProbeStats {
    /// One request sent, one reply received after `rtt`.
    pub fn replied(rtt: Duration) -> Self {
        Self {
            sent: 1,
            recv: 1,
            min_rtt: rtt,
            max_rtt: rtt,
        }
    }

    /// One request sent, no reply before the timeout.
    pub fn lost() -> Self {
        Self {
            sent: 1,
            ..Self::default()
        }
    }

    /// The request never left the host.
    pub fn unsent() -> Self {
        Self::default()
    }

    /// Fraction of requests without a reply, in `[0, 1]`.
    ///
    /// Nothing sent counts as total loss.
    pub fn loss(&self) -> f64 {
        if self.sent == 0 {
            return 1.0;
        }
        (1.0 - f64::from(self.recv) / f64::from(self.sent)).clamp(0.0, 1.0)
    }
}

/// Statistics of one probe cycle for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub target: Target,
    pub min_rtt: Duration,
    pub max_rtt: Duration,
    pub sent: u32,
    pub recv: u32,
    pub loss: f64,
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    pub fn new(target: Target, stats: ProbeStats) -> Self {
        Self {
            target,
            min_rtt: stats.min_rtt,
            max_rtt: stats.max_rtt,
            sent: stats.sent,
            recv: stats.recv,
            loss: stats.loss(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_nothing_sent() {
        let stats = ProbeStats::unsent();
        assert_eq!(stats.loss(), 1.0);
        assert!(!stats.loss().is_nan());
    }

    #[test]
    fn test_loss_all_received() {
        let stats = ProbeStats {
            sent: 4,
            recv: 4,
            ..Default::default()
        };
        assert_eq!(stats.loss(), 0.0);
        assert_eq!(ProbeStats::replied(Duration::from_millis(3)).loss(), 0.0);
    }

    #[test]
    fn test_loss_partial() {
        let stats = ProbeStats {
            sent: 4,
            recv: 1,
            ..Default::default()
        };
        assert!((stats.loss() - 0.75).abs() < f64::EPSILON);
        assert_eq!(ProbeStats::lost().loss(), 1.0);
    }

    #[test]
    fn test_loss_clamped_on_duplicate_replies() {
        let stats = ProbeStats {
            sent: 1,
            recv: 2,
            ..Default::default()
        };
        assert_eq!(stats.loss(), 0.0);
    }

    #[test]
    fn test_sample_copies_stats() {
        let target = Target::new("a", "10.0.0.1");
        let sample = Sample::new(target.clone(), ProbeStats::replied(Duration::from_millis(10)));

        assert_eq!(sample.target, target);
        assert_eq!(sample.sent, 1);
        assert_eq!(sample.recv, 1);
        assert_eq!(sample.min_rtt, Duration::from_millis(10));
        assert_eq!(sample.max_rtt, Duration::from_millis(10));
        assert_eq!(sample.loss, 0.0);
    }
}
