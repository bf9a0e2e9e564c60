//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Sink → Inventory source → Bind listener → Server + Discovery
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Discovery stops → Probers cancelled and joined → Server drains
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
