//! Configuration management.
//!
//! Values come from [`ExporterConfig::default`], optionally overlaid by a JSON
//! file, and finally by command-line flags in the daemon.

use crate::error::{ExporterError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Runtime configuration for the exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Address the HTTP server binds to.
    pub listen_address: String,
    /// Path under which measurements are exposed.
    pub telemetry_path: String,
    /// Hypervisor connection URI, passed through untouched.
    pub uri: String,
    /// Guests and pools collected in parallel per scrape.
    pub scrape_concurrency: usize,
    /// Upper bound on one scrape cycle.
    pub scrape_timeout_secs: u64,
    pub log_level: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:9177".to_string(),
            telemetry_path: "/metrics".to_string(),
            uri: "qemu:///system".to_string(),
            scrape_concurrency: 4,
            scrape_timeout_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

impl ExporterConfig {
    /// Load configuration from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ExporterError::IoError { path: path.to_path_buf(), source: e })?;
        serde_json::from_str(&content).map_err(|e| ExporterError::InvalidConfig {
            reason: format!("Failed to parse config {}: {}", path.display(), e),
        })
    }

    /// Load from `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Reject values the daemon cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if !self.telemetry_path.starts_with('/') {
            return Err(ExporterError::InvalidConfig {
                reason: format!("telemetry_path must start with '/': {}", self.telemetry_path),
            });
        }
        if self.telemetry_path == "/" || self.telemetry_path == "/health" {
            return Err(ExporterError::InvalidConfig {
                reason: format!(
                    "telemetry_path collides with a built-in route: {}",
                    self.telemetry_path
                ),
            });
        }
        if self.scrape_concurrency == 0 {
            return Err(ExporterError::InvalidConfig {
                reason: "scrape_concurrency must be at least 1".to_string(),
            });
        }
        if self.scrape_timeout_secs == 0 {
            return Err(ExporterError::InvalidConfig {
                reason: "scrape_timeout_secs must be at least 1".to_string(),
            });
        }
        if self.uri.trim().is_empty() {
            return Err(ExporterError::InvalidConfig {
                reason: "uri must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_address.parse().map_err(|e| ExporterError::InvalidConfig {
            reason: format!("Invalid listen_address {}: {}", self.listen_address, e),
        })
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs)
    }
}
