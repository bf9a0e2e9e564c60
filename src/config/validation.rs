//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Normalize the listen address (`:8080` means all interfaces)
//! - Validate value ranges (intervals > 0)
//! - Check that the selected inventory backend has what it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PingerConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{DiscoveryMode, InventoryKind, PingerConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid listen address {0:?}")]
    ListenAddress(String),

    #[error("{field} must be greater than zero")]
    ZeroInterval { field: &'static str },

    #[error("inventory.path is required when inventory.kind = \"file\"")]
    MissingInventoryPath,

    #[error("invalid inventory.api_server {0:?}")]
    ApiServer(String),
}

/// Parse a listen address, accepting the `:port` shorthand.
pub fn parse_listen_address(raw: &str) -> Result<SocketAddr, ValidationError> {
    let candidate = if raw.starts_with(':') {
        format!("0.0.0.0{}", raw)
    } else {
        raw.to_string()
    };

    candidate
        .parse()
        .map_err(|_| ValidationError::ListenAddress(raw.to_string()))
}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &PingerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = parse_listen_address(&config.server.listen_address) {
        errors.push(e);
    }

    if config.discovery.mode == DiscoveryMode::Poll && config.discovery.interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval {
            field: "discovery.interval_secs",
        });
    }
    if config.probe.interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval {
            field: "probe.interval_secs",
        });
    }
    if config.probe.timeout_secs == 0 {
        errors.push(ValidationError::ZeroInterval {
            field: "probe.timeout_secs",
        });
    }

    match config.inventory.kind {
        InventoryKind::File if config.inventory.path.is_none() => {
            errors.push(ValidationError::MissingInventoryPath);
        }
        InventoryKind::Kubernetes => {
            if let Some(api) = &config.inventory.api_server {
                if url::Url::parse(api).is_err() {
                    errors.push(ValidationError::ApiServer(api.clone()));
                }
            }
        }
        _ => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
