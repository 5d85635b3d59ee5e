//! Scrape orchestration.
//!
//! One scrape opens one hypervisor connection, collects every guest and
//! storage pool with bounded concurrency, and always closes the connection.
//! A failing guest or pool is dropped from the output; a failure to connect,
//! query versions or enumerate guests fails the whole cycle, which then
//! reports only `libvirt_up 0`.

use super::correlator;
use super::derived;
use super::descriptors as d;
use super::device_config::DeviceDescriptor;
use super::failure::{FailureIsolation, Group, WarningLog};
use super::measurement::Measurement;
use super::projector::{project, MemoryStats, IO_TUNE_FIELDS};
use crate::config::ExporterConfig;
use crate::error::{ExporterError, Result};
use crate::hypervisor::types::{BlockStats, GuestStats, StoragePoolInfo};
use crate::hypervisor::{Connector, HypervisorConnection};
use crate::observability::metrics;
use futures::future;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument, warn};

/// Default number of guests/pools collected in parallel.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Outcome of one scrape cycle.
#[derive(Debug, Clone, Default)]
pub struct ScrapeReport {
    /// Measurements in emission order, ending with `libvirt_up`.
    pub measurements: Vec<Measurement>,
    pub up: bool,
    pub guests_collected: usize,
    pub guests_failed: usize,
    /// Pools skipped, plus one if the pool listing itself failed.
    pub pools_failed: usize,
    pub duration: Duration,
}

/// Closes the connection when the scrape ends, however it ends.
struct Session {
    conn: Box<dyn HypervisorConnection>,
}

impl Session {
    fn connection(&self) -> &dyn HypervisorConnection {
        self.conn.as_ref()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.conn.close();
    }
}

/// Runs scrape cycles against one hypervisor URI.
pub struct Scraper {
    connector: Arc<dyn Connector>,
    uri: String,
    concurrency: usize,
    isolation: FailureIsolation,
}

impl Scraper {
    pub fn new(
        connector: Arc<dyn Connector>,
        uri: impl Into<String>,
        warnings: WarningLog,
    ) -> Self {
        Self {
            connector,
            uri: uri.into(),
            concurrency: DEFAULT_CONCURRENCY,
            isolation: FailureIsolation::new(warnings),
        }
    }

    pub fn from_config(
        connector: Arc<dyn Connector>,
        config: &ExporterConfig,
        warnings: WarningLog,
    ) -> Self {
        Self::new(connector, config.uri.clone(), warnings)
            .with_concurrency(config.scrape_concurrency)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Run one scrape cycle. Never fails; failures show up as `up == false`.
    #[instrument(skip(self), fields(uri = %self.uri))]
    pub async fn scrape(&self) -> ScrapeReport {
        let started = Instant::now();
        let mut report = match self.collect().await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Scrape failed");
                ScrapeReport::default()
            }
        };
        report.measurements.push(derived::up(report.up));
        report.duration = started.elapsed();

        let outcome = if report.up { "success" } else { "failure" };
        metrics::record_scrape(report.duration.as_secs_f64(), outcome);
        if report.up {
            metrics::set_last_scrape_guests(report.guests_collected);
        }
        debug!(
            up = report.up,
            guests = report.guests_collected,
            guests_failed = report.guests_failed,
            pools_failed = report.pools_failed,
            measurements = report.measurements.len(),
            duration_ms = report.duration.as_millis() as u64,
            "Scrape finished"
        );
        report
    }

    async fn collect(&self) -> Result<ScrapeReport> {
        let conn = self
            .connector
            .connect(&self.uri)
            .await
            .map_err(|source| ExporterError::Connectivity { uri: self.uri.clone(), source })?;
        let session = Session { conn };
        let conn = session.connection();

        let versions = conn.versions().await.map_err(ExporterError::transport("host versions"))?;
        let guests =
            conn.guest_stats().await.map_err(ExporterError::transport("guest enumeration"))?;

        let mut report = ScrapeReport { up: true, ..Default::default() };
        report.measurements.push(derived::versions_info(&versions));

        // Futures are built up front; a lazily mapped stream would make the
        // scrape future lose `Send`.
        let pending: Vec<_> = guests.iter().map(|guest| self.collect_guest(conn, guest)).collect();
        let results: Vec<Result<Vec<Measurement>>> =
            stream::iter(pending).buffered(self.concurrency).collect().await;
        for (guest, result) in guests.iter().zip(results) {
            match result {
                Ok(measurements) => {
                    report.guests_collected += 1;
                    report.measurements.extend(measurements);
                }
                Err(e) => {
                    warn!(guest = %guest.name, error = %e, "Dropping guest from scrape");
                    metrics::record_guest_failure(e.kind());
                    report.guests_failed += 1;
                }
            }
        }

        let (pools, pools_failed) = self.collect_pools(conn).await;
        report.measurements.extend(pools);
        report.pools_failed = pools_failed;

        Ok(report)
    }

    /// Collect one guest: metadata and info, vCPUs, disks, interfaces, memory.
    #[instrument(skip_all, fields(guest = %stats.name))]
    async fn collect_guest(
        &self,
        conn: &dyn HypervisorConnection,
        stats: &GuestStats,
    ) -> Result<Vec<Measurement>> {
        let guest = stats.name.as_str();
        let fatal = || ExporterError::transport(format!("guest {}", guest));

        let uuid = conn.guest_uuid(guest).await.map_err(fatal())?;
        let xml = conn.guest_xml(guest).await.map_err(fatal())?;
        let descriptor = DeviceDescriptor::from_xml(&xml)
            .map_err(|e| ExporterError::ParseFailure {
                guest: guest.to_string(),
                reason: e.to_string(),
            })?;
        let info = conn.guest_info(guest).await.map_err(fatal())?;

        let mut out = derived::guest_info_measurements(guest, &uuid, &descriptor.metadata, &info);

        let vcpus = self
            .isolation
            .absorb(Group::Vcpu, guest, conn.vcpu_info(guest).await)
            .map_err(fatal())?;
        if let Some(vcpus) = vcpus {
            out.extend(derived::vcpu_measurements(guest, &vcpus, &stats.vcpu));
        }

        let disks: Vec<&BlockStats> = correlator::reported_disks(&stats.block).collect();
        let tunes =
            future::join_all(disks.iter().map(|disk| conn.block_io_tune(guest, &disk.name))).await;
        for (disk, tune) in disks.into_iter().zip(tunes) {
            out.extend(correlator::disk_measurements(guest, disk, &descriptor));
            let tune = self.isolation.absorb(Group::BlockIoTune, guest, tune).map_err(fatal())?;
            if let Some(tune) = tune {
                out.extend(project(&tune, IO_TUNE_FIELDS, &[guest, disk.name.as_str()]));
            }
        }

        for iface in &stats.net {
            out.extend(correlator::interface_measurements(guest, iface, &descriptor));
        }

        let memory = self
            .isolation
            .absorb(Group::MemoryStats, guest, conn.memory_stats(guest).await)
            .map_err(fatal())?
            .map(|tagged| MemoryStats::from_tagged(&tagged));
        out.extend(derived::memory_measurements(guest, memory.as_ref()));

        Ok(out)
    }

    /// Collect every active storage pool. Returns measurements and the failure count.
    async fn collect_pools(&self, conn: &dyn HypervisorConnection) -> (Vec<Measurement>, usize) {
        let names = match conn.list_storage_pools().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Failed to list storage pools");
                metrics::record_pool_failure();
                return (Vec::new(), 1);
            }
        };

        let pending: Vec<_> = names.iter().map(|name| conn.storage_pool_info(name)).collect();
        let results: Vec<_> = stream::iter(pending).buffered(self.concurrency).collect().await;

        let mut out = Vec::with_capacity(names.len() * 4);
        let mut failed = 0;
        for (name, result) in names.iter().zip(results) {
            match result {
                Ok(info) => out.extend(pool_measurements(name, &info)),
                Err(e) => {
                    warn!(pool = %name, error = %e, "Skipping storage pool");
                    metrics::record_pool_failure();
                    failed += 1;
                }
            }
        }
        (out, failed)
    }
}

/// The four gauges of one storage pool.
pub fn pool_measurements(pool: &str, info: &StoragePoolInfo) -> Vec<Measurement> {
    let labels = || vec![pool.to_string()];
    vec![
        Measurement::new(&d::POOL_STATE, info.state as f64, labels()),
        Measurement::new(&d::POOL_CAPACITY, info.capacity as f64, labels()),
        Measurement::new(&d::POOL_ALLOCATION, info.allocation as f64, labels()),
        Measurement::new(&d::POOL_AVAILABLE, info.available as f64, labels()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypervisor::{ErrorCode, HvResult, HypervisorError};

    #[test]
    fn test_pool_measurements() {
        let info = StoragePoolInfo { state: 2, capacity: 100, allocation: 40, available: 60 };
        let out = pool_measurements("default", &info);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|m| m.label("pool") == Some("default")));
        assert_eq!(out[0].name(), "libvirt_storage_pool_info_state");
        assert_eq!(out[0].value(), 2.0);
        assert_eq!(out[3].value(), 60.0);
    }

    #[test]
    fn test_concurrency_floor() {
        struct Never;
        #[async_trait::async_trait]
        impl Connector for Never {
            async fn connect(&self, _uri: &str) -> HvResult<Box<dyn HypervisorConnection>> {
                Err(HypervisorError::new(ErrorCode::NoConnection, "down"))
            }
            fn name(&self) -> &str {
                "never"
            }
        }
        let scraper =
            Scraper::new(Arc::new(Never), "test:///default", WarningLog::new()).with_concurrency(0);
        assert_eq!(scraper.concurrency, 1);
        assert_eq!(scraper.uri(), "test:///default");
    }
}
