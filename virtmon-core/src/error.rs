//! Error types for virtmon.
//!
//! Soft hypervisor failures (unsupported features, guests in the wrong state)
//! never surface here; they are absorbed by [`crate::telemetry::failure`].

use crate::hypervisor::HypervisorError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for virtmon operations.
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Main error type for virtmon.
#[derive(Error, Debug)]
pub enum ExporterError {
    // Per-guest errors
    #[error("Failed to parse device configuration of guest {guest}: {reason}")]
    ParseFailure { guest: String, reason: String },

    #[error("Hypervisor call failed for {context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: HypervisorError,
    },

    // Per-cycle errors
    #[error("Cannot connect to hypervisor at {uri}: {source}")]
    Connectivity {
        uri: String,
        #[source]
        source: HypervisorError,
    },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O error at {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExporterError {
    /// Wrap a hypervisor error that is fatal for `context` (a guest or the whole cycle).
    pub fn transport(context: impl Into<String>) -> impl FnOnce(HypervisorError) -> Self {
        let context = context.into();
        move |source| ExporterError::Transport { context, source }
    }

    /// Short machine-friendly kind, used as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            ExporterError::ParseFailure { .. } => "parse",
            ExporterError::Transport { .. } => "transport",
            ExporterError::Connectivity { .. } => "connectivity",
            ExporterError::InvalidConfig { .. } => "config",
            ExporterError::IoError { .. } => "io",
        }
    }
}
