//! Telemetry correlation and normalization engine.
//!
//! Turns raw hypervisor samples plus each guest's device configuration into
//! a flat stream of typed, labeled [`Measurement`]s.

pub mod correlator;
pub mod derived;
pub mod descriptors;
pub mod device_config;
pub mod failure;
pub mod measurement;
pub mod projector;
pub mod scrape;

pub use device_config::{
    DescriptorError, DeviceDescriptor, DiskConfig, GuestMetadata, InterfaceConfig,
};
pub use failure::{classify, Disposition, FailureIsolation, Group, WarningLog};
pub use measurement::{Measurement, MetricDesc, MetricKind};
pub use scrape::{ScrapeReport, Scraper};
