//! Inventory subsystem: where probe targets come from.
//!
//! # Data Flow
//! ```text
//! Kubernetes API (kubernetes.rs) ─┐
//!                                 ├→ InventorySnapshot → discovery loop
//! Target file (file.rs) ──────────┘
//! ```
//!
//! # Design Decisions
//! - Every call returns a full snapshot; no incremental diffing here
//! - Any fetch failure is reported to the caller, never papered over with
//!   stale or empty data

pub mod file;
pub mod kubernetes;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::{InventoryConfig, InventoryKind};

pub use file::FileSource;
pub use kubernetes::KubernetesSource;

/// One candidate target reported by an inventory source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InventoryEntry {
    pub name: String,
    pub address: String,
    /// Shares the prober's own network namespace.
    #[serde(default)]
    pub host_network: bool,
}

impl InventoryEntry {
    pub fn new(name: impl Into<String>, address: impl Into<String>, host_network: bool) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            host_network,
        }
    }
}

/// Ordered list of entries from one fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub entries: Vec<InventoryEntry>,
}

impl InventorySnapshot {
    pub fn new(entries: Vec<InventoryEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Errors that can occur while fetching the inventory.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Credentials or connection settings could not be loaded.
    #[error("credentials error: {0}")]
    Credentials(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API server returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed inventory: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A capability to fetch the current set of candidate targets.
#[async_trait]
pub trait InventorySource: Send + Sync + 'static {
    /// Short description for logs.
    fn describe(&self) -> String;

    async fn snapshot(&self) -> Result<InventorySnapshot, InventoryError>;
}

/// Build the configured inventory source.
pub fn from_config(config: &InventoryConfig) -> Result<Arc<dyn InventorySource>, InventoryError> {
    match config.kind {
        InventoryKind::Kubernetes => Ok(Arc::new(KubernetesSource::from_config(config)?)),
        InventoryKind::File => {
            let path = config.path.clone().ok_or_else(|| {
                InventoryError::Credentials("inventory.path is not set".to_string())
            })?;
            Ok(Arc::new(FileSource::new(path)))
        }
    }
}
