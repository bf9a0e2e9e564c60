//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Prober tasks produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (SampleSink → ping_durations_seconds summaries)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;

pub use self::metrics::{PrometheusSink, SampleSink};
