//! virtmon core library.
//!
//! Collects libvirt guest and storage pool telemetry and renders it for
//! Prometheus.

pub mod config;
pub mod error;
pub mod exposition;
pub mod hypervisor;
pub mod observability;
pub mod telemetry;

pub use config::ExporterConfig;
pub use error::{ExporterError, Result};
pub use hypervisor::libvirt::LibvirtConnector;
pub use hypervisor::{Connector, ErrorCode, HypervisorConnection, HypervisorError};
pub use observability::health::{HealthChecker, HealthReport, HealthStatus};
pub use observability::init as init_observability;
pub use telemetry::{Measurement, ScrapeReport, Scraper, WarningLog};
