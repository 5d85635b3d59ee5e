//! End-to-end scrape tests against an in-memory hypervisor.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use virtmon_core::exposition;
use virtmon_core::hypervisor::types::{
    BlockIoTune, BlockStats, GuestInfo, GuestStats, HostVersions, InterfaceStats, MemoryStat,
    StoragePoolInfo, VcpuInfo, VcpuStats,
};
use virtmon_core::hypervisor::{
    Connector, ErrorCode, HvResult, HypervisorConnection, HypervisorError,
};
use virtmon_core::telemetry::{Measurement, Scraper, WarningLog};

fn hv_err(code: ErrorCode) -> HypervisorError {
    HypervisorError::new(code, format!("simulated {}", code))
}

#[derive(Clone)]
struct FakeGuest {
    stats: GuestStats,
    uuid: HvResult<String>,
    xml: String,
    info: HvResult<GuestInfo>,
    vcpus: HvResult<Vec<VcpuInfo>>,
    io_tune: HvResult<BlockIoTune>,
    memory: HvResult<Vec<MemoryStat>>,
}

impl FakeGuest {
    fn running(name: &str) -> Self {
        let xml = format!(
            r#"<domain type='kvm'>
  <name>{name}</name>
  <metadata>
    <nova:instance xmlns:nova="http://openstack.org/xmlns/libvirt/nova/1.1">
      <nova:name>{name}-instance</nova:name>
      <nova:flavor name="m1.small"/>
      <nova:owner>
        <nova:user uuid="u-1">alice</nova:user>
        <nova:project uuid="p-1">web</nova:project>
      </nova:owner>
      <nova:root type="image" uuid="img-1"/>
    </nova:instance>
  </metadata>
  <devices>
    <disk type='file' device='disk'>
      <driver name='qemu' type='qcow2' cache='none'/>
      <source file='/images/{name}.qcow2'/>
      <target dev='vda' bus='virtio'/>
      <serial>abc</serial>
    </disk>
    <disk type='file' device='cdrom'>
      <target dev='hdc' bus='ide'/>
    </disk>
    <interface type='bridge'>
      <source bridge='br0'/>
      <target dev='vnet0'/>
    </interface>
  </devices>
</domain>"#
        );
        Self {
            stats: GuestStats {
                name: name.to_string(),
                block: vec![
                    BlockStats {
                        name: "vda".to_string(),
                        path: Some(format!("/images/{}.qcow2", name)),
                        rd_bytes: Some(4096),
                        rd_times: Some(2_000_000_000),
                        wr_bytes: Some(8192),
                        capacity: Some(10_737_418_240),
                        ..Default::default()
                    },
                    BlockStats { name: "hdc".to_string(), rd_bytes: Some(1), ..Default::default() },
                ],
                net: vec![InterfaceStats {
                    name: "vnet0".to_string(),
                    rx_bytes: Some(1000),
                    tx_bytes: Some(2000),
                    ..Default::default()
                }],
                vcpu: vec![VcpuStats {
                    wait: Some(1_000_000_000),
                    delay: Some(500_000_000),
                    ..Default::default()
                }],
            },
            uuid: Ok(format!("uuid-{}", name)),
            xml,
            info: Ok(GuestInfo {
                state: 1,
                max_memory_kib: 2048,
                memory_kib: 1024,
                nr_virt_cpu: 1,
                cpu_time_ns: 5_000_000_000,
            }),
            vcpus: Ok(vec![VcpuInfo { number: 0, state: 1, cpu_time_ns: 3_000_000_000, cpu: 2 }]),
            io_tune: Ok(BlockIoTune { total_bytes_sec: Some(1_048_576), ..Default::default() }),
            memory: Ok(vec![
                MemoryStat::new(MemoryStat::AVAILABLE, 1000),
                MemoryStat::new(MemoryStat::USABLE, 800),
                MemoryStat::new(MemoryStat::RSS, 2048),
            ]),
        }
    }
}

struct FakeHost {
    connect: HvResult<()>,
    versions: HvResult<HostVersions>,
    guest_listing: HvResult<()>,
    guests: Vec<FakeGuest>,
    pools: HvResult<Vec<String>>,
    pool_info: HashMap<String, HvResult<StoragePoolInfo>>,
}

impl FakeHost {
    fn new(guests: Vec<FakeGuest>) -> Self {
        let mut pool_info = HashMap::new();
        pool_info.insert(
            "default".to_string(),
            Ok(StoragePoolInfo { state: 2, capacity: 1000, allocation: 400, available: 600 }),
        );
        Self {
            connect: Ok(()),
            versions: Ok(HostVersions {
                hypervisor: 6_002_000,
                daemon: 8_000_000,
                library: 1_002_003,
            }),
            guest_listing: Ok(()),
            guests,
            pools: Ok(vec!["default".to_string()]),
            pool_info,
        }
    }

    fn guest(&self, name: &str) -> HvResult<&FakeGuest> {
        self.guests
            .iter()
            .find(|g| g.stats.name == name)
            .ok_or_else(|| {
                HypervisorError::new(ErrorCode::Other, format!("Domain not found: {}", name))
            })
    }
}

#[derive(Default)]
struct Counters {
    connects: AtomicUsize,
    closes: AtomicUsize,
    io_tune_calls: AtomicUsize,
}

struct FakeConnector {
    host: Arc<FakeHost>,
    counters: Arc<Counters>,
}

impl FakeConnector {
    fn new(host: FakeHost) -> (Arc<Self>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        (Arc::new(Self { host: Arc::new(host), counters: counters.clone() }), counters)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, _uri: &str) -> HvResult<Box<dyn HypervisorConnection>> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        self.host.connect.clone()?;
        Ok(Box::new(FakeConnection { host: self.host.clone(), counters: self.counters.clone() }))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

struct FakeConnection {
    host: Arc<FakeHost>,
    counters: Arc<Counters>,
}

#[async_trait]
impl HypervisorConnection for FakeConnection {
    async fn versions(&self) -> HvResult<HostVersions> {
        self.host.versions.clone()
    }

    async fn guest_stats(&self) -> HvResult<Vec<GuestStats>> {
        self.host.guest_listing.clone()?;
        Ok(self.host.guests.iter().map(|g| g.stats.clone()).collect())
    }

    async fn guest_uuid(&self, guest: &str) -> HvResult<String> {
        self.host.guest(guest)?.uuid.clone()
    }

    async fn guest_xml(&self, guest: &str) -> HvResult<String> {
        Ok(self.host.guest(guest)?.xml.clone())
    }

    async fn guest_info(&self, guest: &str) -> HvResult<GuestInfo> {
        self.host.guest(guest)?.info.clone()
    }

    async fn vcpu_info(&self, guest: &str) -> HvResult<Vec<VcpuInfo>> {
        self.host.guest(guest)?.vcpus.clone()
    }

    async fn block_io_tune(&self, guest: &str, _disk: &str) -> HvResult<BlockIoTune> {
        self.counters.io_tune_calls.fetch_add(1, Ordering::SeqCst);
        self.host.guest(guest)?.io_tune.clone()
    }

    async fn memory_stats(&self, guest: &str) -> HvResult<Vec<MemoryStat>> {
        self.host.guest(guest)?.memory.clone()
    }

    async fn list_storage_pools(&self) -> HvResult<Vec<String>> {
        self.host.pools.clone()
    }

    async fn storage_pool_info(&self, pool: &str) -> HvResult<StoragePoolInfo> {
        self.host
            .pool_info
            .get(pool)
            .cloned()
            .unwrap_or_else(|| Err(HypervisorError::new(ErrorCode::Other, "pool not found")))
    }

    fn close(&self) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn find<'a>(out: &'a [Measurement], name: &str) -> Vec<&'a Measurement> {
    out.iter().filter(|m| m.name() == name).collect()
}

fn for_guest<'a>(out: &'a [Measurement], name: &str, guest: &str) -> Vec<&'a Measurement> {
    out.iter().filter(|m| m.name() == name && m.label("domain") == Some(guest)).collect()
}

fn up_value(out: &[Measurement]) -> f64 {
    let up = find(out, "libvirt_up");
    assert_eq!(up.len(), 1);
    up[0].value()
}

#[tokio::test]
async fn test_healthy_scrape() {
    let host = FakeHost::new(vec![FakeGuest::running("web-1")]);
    let (connector, counters) = FakeConnector::new(host);
    let scraper = Scraper::new(connector, "test:///default", WarningLog::new());

    let report = scraper.scrape().await;
    let out = &report.measurements;

    assert!(report.up);
    assert_eq!(up_value(out), 1.0);
    assert_eq!(report.guests_collected, 1);
    assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);

    let versions = find(out, "libvirt_versions_info");
    assert_eq!(versions[0].label("hypervisor_running"), Some("6.2.0"));
    assert_eq!(versions[0].label("libvirt_library"), Some("1.2.3"));

    let meta = find(out, "libvirt_domain_info_meta");
    assert_eq!(meta[0].label("uuid"), Some("uuid-web-1"));
    assert_eq!(meta[0].label("instance_name"), Some("web-1-instance"));
    assert_eq!(meta[0].label("user_name"), Some("alice"));

    assert_eq!(find(out, "libvirt_domain_info_maximum_memory_bytes")[0].value(), 2_097_152.0);
    assert_eq!(find(out, "libvirt_domain_info_cpu_time_seconds_total")[0].value(), 5.0);

    let block_meta = find(out, "libvirt_domain_block_meta");
    assert_eq!(block_meta.len(), 1);
    assert_eq!(block_meta[0].label("target_device"), Some("vda"));
    assert_eq!(block_meta[0].label("serial"), Some("abc"));
    assert_eq!(block_meta[0].label("source_file"), Some("/images/web-1.qcow2"));
    assert_eq!(find(out, "libvirt_domain_block_stats_read_time_seconds_total")[0].value(), 2.0);
    assert!(find(out, "libvirt_domain_block_stats_flush_requests_total").is_empty());

    assert!(out.iter().all(|m| m.label("target_device") != Some("hdc")));
    assert_eq!(counters.io_tune_calls.load(Ordering::SeqCst), 1);
    assert_eq!(find(out, "libvirt_domain_block_stats_limit_total_bytes")[0].value(), 1_048_576.0);

    let iface_meta = find(out, "libvirt_domain_interface_meta");
    assert_eq!(iface_meta.len(), 1);
    assert_eq!(iface_meta[0].label("source_bridge"), Some("br0"));

    assert_eq!(find(out, "libvirt_domain_vcpu_wait_seconds_total")[0].value(), 1.0);
    assert_eq!(find(out, "libvirt_domain_vcpu_cpu")[0].value(), 2.0);

    assert_eq!(find(out, "libvirt_domain_memory_stats_used_percent")[0].value(), 20.0);
    assert_eq!(find(out, "libvirt_domain_memory_stats_rss_bytes")[0].value(), 2_097_152.0);

    assert_eq!(find(out, "libvirt_storage_pool_info_capacity_bytes")[0].value(), 1000.0);

    // up is reported last
    assert_eq!(out.last().map(|m| m.name()), Some("libvirt_up"));
}

#[tokio::test]
async fn test_connectivity_failure_reports_only_down() {
    let mut host = FakeHost::new(vec![FakeGuest::running("web-1")]);
    host.connect = Err(hv_err(ErrorCode::NoConnection));
    let (connector, counters) = FakeConnector::new(host);
    let scraper = Scraper::new(connector, "test:///default", WarningLog::new());

    let report = scraper.scrape().await;
    assert!(!report.up);
    assert_eq!(report.measurements.len(), 1);
    assert_eq!(up_value(&report.measurements), 0.0);
    assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 0);

    // no retry within the cycle
    scraper.scrape().await;
    assert_eq!(counters.connects.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cycle_failure_after_connect_still_closes() {
    let mut host = FakeHost::new(vec![FakeGuest::running("web-1")]);
    host.guest_listing = Err(hv_err(ErrorCode::Other));
    let (connector, counters) = FakeConnector::new(host);
    let scraper = Scraper::new(connector, "test:///default", WarningLog::new());

    let report = scraper.scrape().await;
    assert_eq!(report.measurements.len(), 1);
    assert_eq!(up_value(&report.measurements), 0.0);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);

    let mut host = FakeHost::new(vec![]);
    host.versions = Err(hv_err(ErrorCode::Other));
    let (connector, counters) = FakeConnector::new(host);
    let report = Scraper::new(connector, "test:///default", WarningLog::new()).scrape().await;
    assert!(!report.up);
    assert!(find(&report.measurements, "libvirt_versions_info").is_empty());
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unsupported_vcpu_warns_once_and_keeps_other_groups() {
    let mut a = FakeGuest::running("a");
    let mut b = FakeGuest::running("b");
    a.vcpus = Err(hv_err(ErrorCode::OperationUnsupported));
    b.vcpus = Err(hv_err(ErrorCode::NoSupport));
    let (connector, _) = FakeConnector::new(FakeHost::new(vec![a, b]));
    let warnings = WarningLog::new();
    let scraper = Scraper::new(connector, "test:///default", warnings.clone());

    for _ in 0..2 {
        let report = scraper.scrape().await;
        let out = &report.measurements;
        assert!(report.up);
        assert_eq!(report.guests_collected, 2);
        assert!(out.iter().all(|m| !m.name().starts_with("libvirt_domain_vcpu_")));
        for guest in ["a", "b"] {
            assert_eq!(for_guest(out, "libvirt_domain_block_meta", guest).len(), 1);
            let rx = for_guest(out, "libvirt_domain_interface_stats_receive_bytes_total", guest);
            assert_eq!(rx.len(), 1);
            let used = for_guest(out, "libvirt_domain_memory_stats_used_percent", guest);
            assert_eq!(used[0].value(), 20.0);
        }
    }

    assert!(warnings.contains("vcpu_unsupported"));
    assert_eq!(warnings.len(), 1);
}

#[tokio::test]
async fn test_unsupported_io_tune_skips_only_limits() {
    let mut guest = FakeGuest::running("web-1");
    guest.stats.block.push(BlockStats {
        name: "vdb".to_string(),
        wr_reqs: Some(3),
        ..Default::default()
    });
    guest.io_tune = Err(hv_err(ErrorCode::OperationUnsupported));
    let (connector, counters) = FakeConnector::new(FakeHost::new(vec![guest]));
    let warnings = WarningLog::new();
    let report = Scraper::new(connector, "test:///default", warnings.clone()).scrape().await;
    let out = &report.measurements;

    assert_eq!(counters.io_tune_calls.load(Ordering::SeqCst), 2);
    assert!(out
        .iter()
        .all(|m| !m.name().contains("_limit_") && !m.name().ends_with("size_iops_bytes")));
    assert_eq!(find(out, "libvirt_domain_block_meta").len(), 2);
    assert!(warnings.contains("blkiotune_unsupported"));

    // vdb has no descriptor entry and no live path
    let vdb = find(out, "libvirt_domain_block_meta")
        .into_iter()
        .find(|m| m.label("target_device") == Some("vdb"))
        .unwrap();
    assert_eq!(vdb.label("source_file"), Some(""));
    assert_eq!(vdb.label("serial"), Some(""));
    assert_eq!(find(out, "libvirt_domain_block_stats_write_requests_total")[0].value(), 3.0);
}

#[tokio::test]
async fn test_shut_off_guest_skips_invalid_groups() {
    let mut guest = FakeGuest::running("db-1");
    guest.vcpus = Err(hv_err(ErrorCode::OperationInvalid));
    guest.memory = Err(hv_err(ErrorCode::OperationInvalid));
    guest.stats.vcpu.clear();
    let (connector, _) = FakeConnector::new(FakeHost::new(vec![guest]));
    let warnings = WarningLog::new();
    let report = Scraper::new(connector, "test:///default", warnings.clone()).scrape().await;
    let out = &report.measurements;

    assert!(report.up);
    assert_eq!(report.guests_collected, 1);
    assert!(find(out, "libvirt_domain_vcpu_state").is_empty());
    assert!(find(out, "libvirt_domain_memory_stats_rss_bytes").is_empty());
    let percent = find(out, "libvirt_domain_memory_stats_used_percent");
    assert_eq!(percent.len(), 1);
    assert_eq!(percent[0].value(), 0.0);
    assert!(warnings.is_empty());
}

#[tokio::test]
async fn test_fatal_guest_error_drops_only_that_guest() {
    let mut broken = FakeGuest::running("broken");
    broken.uuid = Err(hv_err(ErrorCode::Other));
    let mut vcpu_broken = FakeGuest::running("vcpu-broken");
    vcpu_broken.vcpus = Err(hv_err(ErrorCode::Other));
    let mut bad_xml = FakeGuest::running("bad-xml");
    bad_xml.xml = "<domain><devices><disk></devices>".to_string();
    let healthy = FakeGuest::running("healthy");

    let host = FakeHost::new(vec![broken, vcpu_broken, bad_xml, healthy]);
    let (connector, counters) = FakeConnector::new(host);
    let report = Scraper::new(connector, "test:///default", WarningLog::new()).scrape().await;
    let out = &report.measurements;

    assert!(report.up);
    assert_eq!(report.guests_collected, 1);
    assert_eq!(report.guests_failed, 3);
    for dropped in ["broken", "vcpu-broken", "bad-xml"] {
        assert!(
            out.iter().all(|m| m.label("domain") != Some(dropped)),
            "{} leaked measurements",
            dropped
        );
    }
    assert_eq!(for_guest(out, "libvirt_domain_info_meta", "healthy").len(), 1);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failing_pool_is_skipped() {
    let mut host = FakeHost::new(vec![FakeGuest::running("web-1")]);
    host.pools = Ok(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    host.pool_info.insert("a".to_string(), Ok(StoragePoolInfo { state: 2, ..Default::default() }));
    host.pool_info.insert("b".to_string(), Err(hv_err(ErrorCode::Other)));
    host.pool_info.insert("c".to_string(), Ok(StoragePoolInfo { state: 0, ..Default::default() }));
    let (connector, _) = FakeConnector::new(host);
    let report = Scraper::new(connector, "test:///default", WarningLog::new()).scrape().await;
    let out = &report.measurements;

    assert!(report.up);
    assert_eq!(report.pools_failed, 1);
    let pools: Vec<&str> = find(out, "libvirt_storage_pool_info_state")
        .into_iter()
        .filter_map(|m| m.label("pool"))
        .collect();
    assert_eq!(pools, vec!["a", "c"]);
    assert_eq!(find(out, "libvirt_storage_pool_info_capacity_bytes").len(), 2);
    assert_eq!(find(out, "libvirt_domain_info_meta").len(), 1);
}

#[tokio::test]
async fn test_pool_listing_failure_keeps_cycle_up() {
    let mut host = FakeHost::new(vec![FakeGuest::running("web-1")]);
    host.pools = Err(hv_err(ErrorCode::Other));
    let (connector, _) = FakeConnector::new(host);
    let report = Scraper::new(connector, "test:///default", WarningLog::new()).scrape().await;

    assert!(report.up);
    assert_eq!(up_value(&report.measurements), 1.0);
    assert!(report.measurements.iter().all(|m| !m.name().starts_with("libvirt_storage_pool")));
}

#[tokio::test]
async fn test_parallel_collection_preserves_guest_order() {
    let names: Vec<String> = (0..12).map(|i| format!("guest-{:02}", i)).collect();
    let guests = names.iter().map(|n| FakeGuest::running(n)).collect();
    let (connector, counters) = FakeConnector::new(FakeHost::new(guests));
    let scraper = Scraper::new(connector, "test:///default", WarningLog::new()).with_concurrency(3);
    let report = scraper.scrape().await;

    let order: Vec<&str> = find(&report.measurements, "libvirt_domain_info_meta")
        .into_iter()
        .filter_map(|m| m.label("domain"))
        .collect();
    assert_eq!(order, names.iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rendered_exposition() {
    let (connector, _) = FakeConnector::new(FakeHost::new(vec![FakeGuest::running("web-1")]));
    let report = Scraper::new(connector, "test:///default", WarningLog::new()).scrape().await;
    let text = exposition::render(&report.measurements);

    assert!(text.contains("# TYPE libvirt_domain_block_stats_read_bytes_total counter"));
    assert!(text.contains(
        r#"libvirt_domain_block_stats_read_bytes_total{domain="web-1",target_device="vda"} 4096"#
    ));
    assert!(text.contains(concat!(
        r#"libvirt_versions_info{hypervisor_running="6.2.0","#,
        r#"libvirtd_running="8.0.0",libvirt_library="1.2.3"} 1"#
    )));
    assert!(text.ends_with("libvirt_up 1\n"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scrape_runs_on_spawned_task() {
    let host = FakeHost::new(vec![FakeGuest::running("web-1"), FakeGuest::running("web-2")]);
    let (connector, counters) = FakeConnector::new(host);
    let scraper =
        Scraper::new(connector, "test:///default", WarningLog::new()).with_concurrency(2);
    let scraper = Arc::new(scraper);

    let task = {
        let scraper = scraper.clone();
        tokio::spawn(async move { scraper.scrape().await })
    };
    let report = task.await.unwrap();

    assert!(report.up);
    assert_eq!(report.guests_collected, 2);
    assert_eq!(report.pools_failed, 0);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}
