//! Discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (runner.rs)
//!     → InventorySource::snapshot()
//!     → select_targets (drop host-network entries)
//!     → ProberFleet::spawn per target (fleet.rs, deduplicated)
//!     → ProberFleet::retain (stop vanished targets)
//! ```
//!
//! # Design Decisions
//! - At most one prober per target; repeated cycles never stack tasks
//! - Inventory errors are fatal to the loop and bubble up to main
//! - Each prober owns a child cancellation token of the process token

pub mod fleet;
pub mod runner;

pub use fleet::{ActiveTarget, ProberFleet};
pub use runner::{select_targets, CycleReport, DiscoveryLoop};
