//! libvirt-backed hypervisor access through the `virt` bindings.
//!
//! One read-only `virConnect` is opened per scrape and shared by every call
//! of that scrape. libvirt calls block, so each one runs on tokio's blocking
//! pool.

use super::types::{
    BlockIoTune, GuestInfo, GuestStats, HostVersions, MemoryStat, StoragePoolInfo, VcpuInfo,
};
use super::{Connector, ErrorCode, HvResult, HypervisorConnection, HypervisorError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, instrument, warn};
use virt::connect::Connect;
use virt::domain::Domain;
use virt::error::{Error as VirtError, ErrorNumber};
use virt::storage_pool::StoragePool;

pub mod params;
mod raw;

// virConnectListAllStoragePoolsFlags
const LIST_ACTIVE_POOLS: u32 = 1 << 1;

/// Reduce a libvirt error number to the codes the exporter distinguishes.
pub fn error_code(number: ErrorNumber) -> ErrorCode {
    match number {
        ErrorNumber::OperationUnsupported => ErrorCode::OperationUnsupported,
        ErrorNumber::NoSupport => ErrorCode::NoSupport,
        ErrorNumber::OperationInvalid => ErrorCode::OperationInvalid,
        ErrorNumber::NoConnect | ErrorNumber::InvalidConn => ErrorCode::NoConnection,
        _ => ErrorCode::Other,
    }
}

impl From<VirtError> for HypervisorError {
    fn from(err: VirtError) -> Self {
        HypervisorError::new(error_code(err.code()), err.message())
    }
}

/// Opens [`LibvirtConnection`]s.
#[derive(Debug, Clone, Default)]
pub struct LibvirtConnector;

impl LibvirtConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for LibvirtConnector {
    #[instrument(skip(self))]
    async fn connect(&self, uri: &str) -> HvResult<Box<dyn HypervisorConnection>> {
        let target = uri.to_string();
        let handle = tokio::task::spawn_blocking(move || {
            let conn = Connect::open_read_only(Some(target.as_str()))?;
            Ok::<_, VirtError>(Handle { uri: target, conn })
        })
        .await
        .map_err(|e| {
            HypervisorError::new(ErrorCode::NoConnection, format!("connect task failed: {}", e))
        })?
        .map_err(|e| {
            let err = HypervisorError::from(e);
            match err.code {
                ErrorCode::Other => HypervisorError::new(ErrorCode::NoConnection, err.message),
                _ => err,
            }
        })?;
        debug!(uri = %uri, "Connected to hypervisor");
        Ok(Box::new(LibvirtConnection { handle: Mutex::new(Some(Arc::new(handle))) }))
    }

    fn name(&self) -> &str {
        "libvirt"
    }
}

/// Owns the libvirt connection; closing happens when the last user drops it.
struct Handle {
    uri: String,
    conn: Connect,
}

// SAFETY: libvirt connection objects are thread-safe; calls on one
// `virConnectPtr` may be issued from several threads at once.
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}

impl Drop for Handle {
    fn drop(&mut self) {
        match self.conn.close() {
            Ok(_) => debug!(uri = %self.uri, "Closed hypervisor connection"),
            Err(e) => warn!(uri = %self.uri, error = %e, "Failed to close hypervisor connection"),
        }
    }
}

/// A read-only libvirt connection.
///
/// Calls still running when [`close`](HypervisorConnection::close) is invoked
/// keep the connection alive until they return.
pub struct LibvirtConnection {
    handle: Mutex<Option<Arc<Handle>>>,
}

impl LibvirtConnection {
    fn handle(&self) -> HvResult<Arc<Handle>> {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| HypervisorError::new(ErrorCode::NoConnection, "connection is closed"))
    }

    /// Run `call` against the connection on the blocking pool.
    async fn blocking<T, F>(&self, call: F) -> HvResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connect) -> HvResult<T> + Send + 'static,
    {
        let handle = self.handle()?;
        tokio::task::spawn_blocking(move || call(&handle.conn))
            .await
            .map_err(|e| {
                HypervisorError::new(ErrorCode::Other, format!("libvirt call failed: {}", e))
            })?
    }

    /// Run `call` against the guest named `guest`.
    ///
    /// Guests are looked up by name only, so numeric names are never taken
    /// for domain IDs.
    async fn with_guest<T, F>(&self, guest: &str, call: F) -> HvResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Domain) -> HvResult<T> + Send + 'static,
    {
        let guest = guest.to_string();
        self.blocking(move |conn| {
            let domain = Domain::lookup_by_name(conn, &guest)?;
            call(&domain)
        })
        .await
    }
}

#[async_trait]
impl HypervisorConnection for LibvirtConnection {
    async fn versions(&self) -> HvResult<HostVersions> {
        self.blocking(|conn| {
            Ok(HostVersions {
                hypervisor: u64::from(conn.get_hyp_version()?),
                daemon: u64::from(conn.get_lib_version()?),
                library: u64::from(Connect::get_version()?),
            })
        })
        .await
    }

    async fn guest_stats(&self) -> HvResult<Vec<GuestStats>> {
        self.blocking(raw::all_domain_stats).await
    }

    async fn guest_uuid(&self, guest: &str) -> HvResult<String> {
        self.with_guest(guest, |domain| Ok(domain.get_uuid_string()?)).await
    }

    async fn guest_xml(&self, guest: &str) -> HvResult<String> {
        self.with_guest(guest, |domain| Ok(domain.get_xml_desc(0)?)).await
    }

    async fn guest_info(&self, guest: &str) -> HvResult<GuestInfo> {
        self.with_guest(guest, |domain| {
            let info = domain.get_info()?;
            Ok(GuestInfo {
                state: info.state as u8,
                max_memory_kib: info.max_mem,
                memory_kib: info.memory,
                nr_virt_cpu: info.nr_virt_cpu,
                cpu_time_ns: info.cpu_time,
            })
        })
        .await
    }

    async fn vcpu_info(&self, guest: &str) -> HvResult<Vec<VcpuInfo>> {
        self.with_guest(guest, |domain| {
            let count = domain.get_info()?.nr_virt_cpu;
            raw::vcpus(domain, count)
        })
        .await
    }

    async fn block_io_tune(&self, guest: &str, disk: &str) -> HvResult<BlockIoTune> {
        let disk = disk.to_string();
        self.with_guest(guest, move |domain| {
            Ok(params::block_io_tune(&raw::block_io_tune(domain, &disk)?))
        })
        .await
    }

    async fn memory_stats(&self, guest: &str) -> HvResult<Vec<MemoryStat>> {
        self.with_guest(guest, |domain| {
            let stats = domain.memory_stats(0)?;
            Ok(stats.iter().map(|s| MemoryStat::new(s.tag as i32, s.val)).collect())
        })
        .await
    }

    async fn list_storage_pools(&self) -> HvResult<Vec<String>> {
        self.blocking(|conn| {
            conn.list_all_storage_pools(LIST_ACTIVE_POOLS)?
                .iter()
                .map(|pool| pool.get_name().map_err(HypervisorError::from))
                .collect()
        })
        .await
    }

    async fn storage_pool_info(&self, pool: &str) -> HvResult<StoragePoolInfo> {
        let pool = pool.to_string();
        self.blocking(move |conn| {
            let info = StoragePool::lookup_by_name(conn, &pool)?.get_info()?;
            Ok(StoragePoolInfo {
                state: info.state as u8,
                capacity: info.capacity,
                allocation: info.allocation,
                available: info.available,
            })
        })
        .await
    }

    fn close(&self) {
        // Dropping our reference closes the connection once in-flight calls finish.
        let released = self.handle.lock().unwrap_or_else(PoisonError::into_inner).take();
        if released.is_none() {
            debug!("Hypervisor connection already released");
        }
    }
}
