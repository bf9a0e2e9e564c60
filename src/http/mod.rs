//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! Scraper → GET /metrics → handlers.rs → PrometheusHandle::render
//! Operator → GET /targets → handlers.rs → ProberFleet::targets
//! Kubelet → GET /healthz → "ok"
//! ```

pub mod handlers;
pub mod server;

pub use server::{AppState, MetricsServer};
