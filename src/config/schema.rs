//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the prober.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the prober.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PingerConfig {
    /// Metrics HTTP server settings.
    pub server: ServerConfig,

    /// Discovery loop settings.
    pub discovery: DiscoveryConfig,

    /// Where targets come from.
    pub inventory: InventoryConfig,

    /// Per-target probe settings.
    pub probe: ProbeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Metrics HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address. Accepts `host:port` or `:port` (all interfaces).
    pub listen_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: ":8080".to_string(),
        }
    }
}

/// How often the inventory is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// Single pass at startup.
    Once,
    /// Re-read the inventory every `interval_secs`.
    #[default]
    Poll,
}

/// Discovery loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub mode: DiscoveryMode,

    /// Polling interval in seconds.
    pub interval_secs: u64,

    /// Stop probing targets that disappear from the inventory.
    pub prune_missing: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            mode: DiscoveryMode::Poll,
            interval_secs: 30,
            prune_missing: true,
        }
    }
}

/// Inventory backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InventoryKind {
    /// Pods listed from the Kubernetes API server.
    #[default]
    Kubernetes,
    /// Static TOML target file.
    File,
}

/// Inventory source configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct InventoryConfig {
    pub kind: InventoryKind,

    /// Target file (required when `kind = "file"`).
    pub path: Option<PathBuf>,

    /// Restrict pod listing to one namespace (all namespaces when unset).
    pub namespace: Option<String>,

    /// Kubernetes label selector, e.g. `app=web`.
    pub label_selector: Option<String>,

    /// API server base URL. Defaults to the in-cluster service address.
    pub api_server: Option<String>,

    /// Service account token path override.
    pub token_path: Option<PathBuf>,

    /// Cluster CA bundle path override.
    pub ca_path: Option<PathBuf>,
}

/// Probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Delay between probes of the same target in seconds.
    pub interval_secs: u64,

    /// Maximum wait for an echo reply in seconds.
    pub timeout_secs: u64,

    /// Use raw ICMP sockets (requires CAP_NET_RAW).
    pub privileged: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3,
            timeout_secs: 2,
            privileged: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: PingerConfig = toml::from_str("").unwrap();

        assert_eq!(config.server.listen_address, ":8080");
        assert_eq!(config.discovery.mode, DiscoveryMode::Poll);
        assert_eq!(config.discovery.interval_secs, 30);
        assert!(config.discovery.prune_missing);
        assert_eq!(config.inventory.kind, InventoryKind::Kubernetes);
        assert_eq!(config.probe.interval_secs, 3);
        assert!(config.probe.privileged);
    }

    #[test]
    fn test_partial_sections() {
        let config: PingerConfig = toml::from_str(
            r#"
            [discovery]
            mode = "once"

            [inventory]
            kind = "file"
            path = "targets.toml"

            [probe]
            privileged = false
            "#,
        )
        .unwrap();

        assert_eq!(config.discovery.mode, DiscoveryMode::Once);
        assert_eq!(config.discovery.interval_secs, 30);
        assert_eq!(config.inventory.kind, InventoryKind::File);
        assert_eq!(config.inventory.path, Some(PathBuf::from("targets.toml")));
        assert!(!config.probe.privileged);
        assert_eq!(config.probe.timeout_secs, 2);
    }
}
