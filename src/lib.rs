//! Cluster-wide ICMP latency prober library.

pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod inventory;
pub mod lifecycle;
pub mod observability;
pub mod probe;

pub use config::PingerConfig;
pub use error::{Error, Severity};
pub use lifecycle::Shutdown;
