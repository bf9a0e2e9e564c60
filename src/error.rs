//! Top-level error type.
//!
//! Every failure is tagged with a [`Severity`]. Fatal errors end the process;
//! recoverable ones are logged by the task that hit them, which carries on.

use thiserror::Error;

use crate::config::ConfigError;
use crate::inventory::InventoryError;
use crate::probe::ProbeError;

/// Whether an error should take the process down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// No useful work can be done; exit non-zero.
    Fatal,
    /// Affects a single target only; log and continue.
    Recoverable,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("inventory unavailable: {0}")]
    Inventory(#[from] InventoryError),

    #[error("metrics listener failed: {0}")]
    Listener(#[source] std::io::Error),

    #[error("metrics recorder setup failed: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

impl Error {
    pub fn severity(&self) -> Severity {
        match self {
            Error::Probe(_) => Severity::Recoverable,
            Error::Config(_) | Error::Inventory(_) | Error::Listener(_) | Error::Metrics(_) => {
                Severity::Fatal
            }
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
