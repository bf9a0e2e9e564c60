//! Static target file.
//!
//! ```toml
//! [[targets]]
//! name = "web-0"
//! address = "10.0.0.12"
//!
//! [[targets]]
//! name = "node-exporter"
//! address = "10.0.0.1"
//! host_network = true
//! ```
//!
//! The file is re-read on every snapshot so edits are picked up by the next
//! discovery cycle.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use crate::inventory::{InventoryEntry, InventoryError, InventorySnapshot, InventorySource};

#[derive(Debug, Deserialize)]
struct TargetFile {
    #[serde(default)]
    targets: Vec<InventoryEntry>,
}

/// Inventory read from a TOML file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse target file contents.
pub fn parse_targets(content: &str) -> Result<InventorySnapshot, InventoryError> {
    let file: TargetFile = toml::from_str(content)?;
    Ok(InventorySnapshot::new(file.targets))
}

#[async_trait]
impl InventorySource for FileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn snapshot(&self) -> Result<InventorySnapshot, InventoryError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        parse_targets(&content)
    }
}
