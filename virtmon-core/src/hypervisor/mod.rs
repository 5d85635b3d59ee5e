//! Hypervisor access abstraction.
//!
//! The telemetry engine only talks to the hypervisor through the
//! [`Connector`] and [`HypervisorConnection`] traits. The shipped backend is
//! [`libvirt::LibvirtConnector`]; tests substitute in-memory fakes.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod libvirt;
pub mod types;

pub use types::{
    BlockIoTune, BlockStats, GuestInfo, GuestStats, HostVersions, InterfaceStats, MemoryStat,
    StoragePoolInfo, VcpuInfo, VcpuStats,
};

/// Result type for raw hypervisor calls.
pub type HvResult<T> = std::result::Result<T, HypervisorError>;

/// Error codes reported by the hypervisor API, reduced to the ones the
/// exporter distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The operation is not supported by this hypervisor or host.
    OperationUnsupported,
    /// The connection driver does not implement the call at all.
    NoSupport,
    /// The operation is not valid for the guest's current state.
    OperationInvalid,
    /// No usable connection to the hypervisor.
    NoConnection,
    Other,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::OperationUnsupported => "operation_unsupported",
            ErrorCode::NoSupport => "no_support",
            ErrorCode::OperationInvalid => "operation_invalid",
            ErrorCode::NoConnection => "no_connection",
            ErrorCode::Other => "other",
        };
        f.write_str(s)
    }
}

/// Error returned by a single hypervisor call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code: {code})")]
pub struct HypervisorError {
    pub code: ErrorCode,
    pub message: String,
}

impl HypervisorError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// Opens connections to a hypervisor.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a read-only connection to `uri`.
    async fn connect(&self, uri: &str) -> HvResult<Box<dyn HypervisorConnection>>;

    /// Backend name (for logging).
    fn name(&self) -> &str;
}

/// One open, read-only hypervisor connection.
///
/// Every method corresponds to one hypervisor API call; implementations must
/// not retry.
#[async_trait]
pub trait HypervisorConnection: Send + Sync {
    /// Hypervisor, daemon and client library versions as packed integers.
    async fn versions(&self) -> HvResult<HostVersions>;

    /// Enumerate running and shut-off guests with their raw statistics.
    async fn guest_stats(&self) -> HvResult<Vec<GuestStats>>;

    async fn guest_uuid(&self, guest: &str) -> HvResult<String>;

    /// The guest's device configuration document (domain XML).
    async fn guest_xml(&self, guest: &str) -> HvResult<String>;

    async fn guest_info(&self, guest: &str) -> HvResult<GuestInfo>;

    /// Per-vCPU scheduling information. Fails with
    /// [`ErrorCode::OperationInvalid`] for guests that are not running.
    async fn vcpu_info(&self, guest: &str) -> HvResult<Vec<VcpuInfo>>;

    /// I/O throttling limits of one disk.
    async fn block_io_tune(&self, guest: &str, disk: &str) -> HvResult<BlockIoTune>;

    /// Balloon driver statistics as tagged values.
    async fn memory_stats(&self, guest: &str) -> HvResult<Vec<MemoryStat>>;

    /// Names of active storage pools.
    async fn list_storage_pools(&self) -> HvResult<Vec<String>>;

    async fn storage_pool_info(&self, pool: &str) -> HvResult<StoragePoolInfo>;

    /// Release the connection. Called exactly once per scrape.
    fn close(&self);
}
