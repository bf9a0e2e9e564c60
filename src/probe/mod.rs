//! Probing subsystem.
//!
//! # Data Flow
//! ```text
//! Prober task (prober.rs), one per target:
//!     Open echo session (icmp.rs via the Pinger trait)
//!     → one request, await reply or timeout
//!     → ProbeStats → Sample (sample.rs)
//!     → SampleSink
//!     → sleep fixed interval, repeat until cancelled
//! ```
//!
//! # Design Decisions
//! - A timeout is an observation (lost packet), not an error
//! - Session setup failures are recoverable and never end the task
//! - No backoff: unreachable targets keep the same cadence

pub mod icmp;
pub mod prober;
pub mod sample;
pub mod target;

use async_trait::async_trait;
use thiserror::Error;

pub use icmp::IcmpPinger;
pub use prober::Prober;
pub use sample::{ProbeStats, Sample};
pub use target::Target;

/// Failure to set up an echo session for one target.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    #[error("failed to resolve {host:?}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open ICMP socket: {0}")]
    Socket(#[source] std::io::Error),
}

impl ProbeError {
    /// Short label used for the failure counter.
    pub fn reason(&self) -> &'static str {
        match self {
            ProbeError::InvalidAddress(_) => "invalid_address",
            ProbeError::Resolve { .. } => "resolve_failed",
            ProbeError::Socket(_) => "socket_failed",
        }
    }
}

/// Sends a single echo request to a target.
#[async_trait]
pub trait Pinger: Send + Sync + 'static {
    async fn ping(&self, target: &Target) -> Result<ProbeStats, ProbeError>;
}
