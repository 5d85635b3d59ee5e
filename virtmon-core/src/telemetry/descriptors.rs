//! Every series the exporter can emit.
//!
//! Names follow Prometheus conventions (`_total` for counters, `_bytes` and
//! `_seconds` for canonical units) and stay compatible with existing libvirt
//! dashboards.

use super::measurement::{MetricDesc, MetricKind};

const GUEST: &[&str] = &["domain"];
const GUEST_DEVICE: &[&str] = &["domain", "target_device"];
const GUEST_VCPU: &[&str] = &["domain", "vcpu"];
const POOL: &[&str] = &["pool"];

const fn gauge(
    name: &'static str,
    help: &'static str,
    labels: &'static [&'static str],
) -> MetricDesc {
    MetricDesc { name, help, kind: MetricKind::Gauge, labels }
}

const fn counter(
    name: &'static str,
    help: &'static str,
    labels: &'static [&'static str],
) -> MetricDesc {
    MetricDesc { name, help, kind: MetricKind::Counter, labels }
}

// Scrape status
pub const UP: MetricDesc =
    gauge("libvirt_up", "Whether scraping libvirt's metrics was successful.", &[]);
pub const VERSIONS_INFO: MetricDesc = gauge(
    "libvirt_versions_info",
    "Versions of virtualization components.",
    &["hypervisor_running", "libvirtd_running", "libvirt_library"],
);

// Guest info
pub const DOMAIN_META: MetricDesc = gauge(
    "libvirt_domain_info_meta",
    "Domain metadata.",
    &[
        "domain",
        "uuid",
        "instance_name",
        "flavor",
        "user_name",
        "user_uuid",
        "project_name",
        "project_uuid",
        "root_type",
        "root_uuid",
    ],
);
pub const DOMAIN_MAX_MEMORY: MetricDesc = gauge(
    "libvirt_domain_info_maximum_memory_bytes",
    "Maximum allowed memory of the domain, in bytes.",
    GUEST,
);
pub const DOMAIN_MEMORY_USAGE: MetricDesc = gauge(
    "libvirt_domain_info_memory_usage_bytes",
    "Memory usage of the domain, in bytes.",
    GUEST,
);
pub const DOMAIN_VIRTUAL_CPUS: MetricDesc = gauge(
    "libvirt_domain_info_virtual_cpus",
    "Number of virtual CPUs for the domain.",
    GUEST,
);
pub const DOMAIN_CPU_TIME: MetricDesc = counter(
    "libvirt_domain_info_cpu_time_seconds_total",
    "Amount of CPU time used by the domain, in seconds.",
    GUEST,
);
pub const DOMAIN_STATE: MetricDesc = gauge(
    "libvirt_domain_info_vstate",
    "Domain state. 0: no state, 1: running, 2: blocked on resource, 3: paused by user, \
     4: being shut down, 5: shut off, 6: crashed, 7: suspended by guest power management.",
    GUEST,
);

// vCPUs
pub const VCPU_STATE: MetricDesc = gauge(
    "libvirt_domain_vcpu_state",
    "VCPU state. 0: offline, 1: running, 2: blocked.",
    GUEST_VCPU,
);
pub const VCPU_TIME: MetricDesc = counter(
    "libvirt_domain_vcpu_time_seconds_total",
    "Amount of CPU time used by the domain's VCPU, in seconds.",
    GUEST_VCPU,
);
pub const VCPU_CPU: MetricDesc = gauge(
    "libvirt_domain_vcpu_cpu",
    "Real CPU number the VCPU runs on, or -1 when offline.",
    GUEST_VCPU,
);
pub const VCPU_WAIT: MetricDesc = counter(
    "libvirt_domain_vcpu_wait_seconds_total",
    concat!(
        "Time the VCPU spent waiting for resources, in seconds. ",
        "Requires CONFIG_SCHEDSTATS on the host."
    ),
    GUEST_VCPU,
);
pub const VCPU_DELAY: MetricDesc = counter(
    "libvirt_domain_vcpu_delay_seconds_total",
    "Time the VCPU thread was queued by the host scheduler instead of running, in seconds.",
    GUEST_VCPU,
);

// Block devices
pub const BLOCK_META: MetricDesc = gauge(
    "libvirt_domain_block_meta",
    "Block device metadata. Device name, source file, serial.",
    &[
        "domain",
        "target_device",
        "source_file",
        "serial",
        "bus",
        "disk_type",
        "driver_type",
        "cache",
        "discard",
    ],
);
pub const BLOCK_READ_BYTES: MetricDesc = counter(
    "libvirt_domain_block_stats_read_bytes_total",
    "Number of bytes read from a block device, in bytes.",
    GUEST_DEVICE,
);
pub const BLOCK_READ_REQUESTS: MetricDesc = counter(
    "libvirt_domain_block_stats_read_requests_total",
    "Number of read requests from a block device.",
    GUEST_DEVICE,
);
pub const BLOCK_READ_TIME: MetricDesc = counter(
    "libvirt_domain_block_stats_read_time_seconds_total",
    "Total time spent on reads from a block device, in seconds.",
    GUEST_DEVICE,
);
pub const BLOCK_WRITE_BYTES: MetricDesc = counter(
    "libvirt_domain_block_stats_write_bytes_total",
    "Number of bytes written to a block device, in bytes.",
    GUEST_DEVICE,
);
pub const BLOCK_WRITE_REQUESTS: MetricDesc = counter(
    "libvirt_domain_block_stats_write_requests_total",
    "Number of write requests to a block device.",
    GUEST_DEVICE,
);
pub const BLOCK_WRITE_TIME: MetricDesc = counter(
    "libvirt_domain_block_stats_write_time_seconds_total",
    "Total time spent on writes to a block device, in seconds.",
    GUEST_DEVICE,
);
pub const BLOCK_FLUSH_REQUESTS: MetricDesc = counter(
    "libvirt_domain_block_stats_flush_requests_total",
    "Total flush requests from a block device.",
    GUEST_DEVICE,
);
pub const BLOCK_FLUSH_TIME: MetricDesc = counter(
    "libvirt_domain_block_stats_flush_time_seconds_total",
    "Total time spent on cache flushing to a block device, in seconds.",
    GUEST_DEVICE,
);
pub const BLOCK_ALLOCATION: MetricDesc = gauge(
    "libvirt_domain_block_stats_allocation",
    "Offset of the highest written sector on a block device.",
    GUEST_DEVICE,
);
pub const BLOCK_CAPACITY: MetricDesc = gauge(
    "libvirt_domain_block_stats_capacity_bytes",
    "Logical size of the block device backing image, in bytes.",
    GUEST_DEVICE,
);
pub const BLOCK_PHYSICAL: MetricDesc = gauge(
    "libvirt_domain_block_stats_physicalsize_bytes",
    "Physical size of the container of the backing image, in bytes.",
    GUEST_DEVICE,
);

// Block I/O throttling
pub const LIMIT_TOTAL_BYTES: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_total_bytes",
    "Total throughput limit in bytes per second.",
    GUEST_DEVICE,
);
pub const LIMIT_WRITE_BYTES: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_write_bytes",
    "Write throughput limit in bytes per second.",
    GUEST_DEVICE,
);
pub const LIMIT_READ_BYTES: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_read_bytes",
    "Read throughput limit in bytes per second.",
    GUEST_DEVICE,
);
pub const LIMIT_TOTAL_REQUESTS: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_total_requests",
    "Total requests per second limit.",
    GUEST_DEVICE,
);
pub const LIMIT_WRITE_REQUESTS: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_write_requests",
    "Write requests per second limit.",
    GUEST_DEVICE,
);
pub const LIMIT_READ_REQUESTS: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_read_requests",
    "Read requests per second limit.",
    GUEST_DEVICE,
);
pub const LIMIT_BURST_TOTAL_BYTES: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_burst_total_bytes",
    "Total throughput burst limit in bytes per second.",
    GUEST_DEVICE,
);
pub const LIMIT_BURST_WRITE_BYTES: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_burst_write_bytes",
    "Write throughput burst limit in bytes per second.",
    GUEST_DEVICE,
);
pub const LIMIT_BURST_READ_BYTES: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_burst_read_bytes",
    "Read throughput burst limit in bytes per second.",
    GUEST_DEVICE,
);
pub const LIMIT_BURST_TOTAL_REQUESTS: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_burst_total_requests",
    "Total requests per second burst limit.",
    GUEST_DEVICE,
);
pub const LIMIT_BURST_WRITE_REQUESTS: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_burst_write_requests",
    "Write requests per second burst limit.",
    GUEST_DEVICE,
);
pub const LIMIT_BURST_READ_REQUESTS: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_burst_read_requests",
    "Read requests per second burst limit.",
    GUEST_DEVICE,
);
pub const LIMIT_BURST_TOTAL_BYTES_LENGTH: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_burst_total_bytes_length_seconds",
    "Total throughput burst time in seconds.",
    GUEST_DEVICE,
);
pub const LIMIT_BURST_WRITE_BYTES_LENGTH: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_burst_write_bytes_length_seconds",
    "Write throughput burst time in seconds.",
    GUEST_DEVICE,
);
pub const LIMIT_BURST_READ_BYTES_LENGTH: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_burst_read_bytes_length_seconds",
    "Read throughput burst time in seconds.",
    GUEST_DEVICE,
);
pub const LIMIT_BURST_TOTAL_REQUESTS_LENGTH: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_burst_length_total_requests_seconds",
    "Total requests per second burst time in seconds.",
    GUEST_DEVICE,
);
pub const LIMIT_BURST_WRITE_REQUESTS_LENGTH: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_burst_length_write_requests_seconds",
    "Write requests per second burst time in seconds.",
    GUEST_DEVICE,
);
pub const LIMIT_BURST_READ_REQUESTS_LENGTH: MetricDesc = gauge(
    "libvirt_domain_block_stats_limit_burst_length_read_requests_seconds",
    "Read requests per second burst time in seconds.",
    GUEST_DEVICE,
);
pub const LIMIT_SIZE_IOPS: MetricDesc = gauge(
    "libvirt_domain_block_stats_size_iops_bytes",
    "Size of I/O operations per second permitted through a block device.",
    GUEST_DEVICE,
);

// Network interfaces
pub const INTERFACE_META: MetricDesc = gauge(
    "libvirt_domain_interface_meta",
    "Interface metadata. Source bridge, target device, virtual interface id.",
    &["domain", "source_bridge", "target_device", "virtual_interface"],
);
pub const IFACE_RX_BYTES: MetricDesc = counter(
    "libvirt_domain_interface_stats_receive_bytes_total",
    "Number of bytes received on a network interface, in bytes.",
    GUEST_DEVICE,
);
pub const IFACE_RX_PACKETS: MetricDesc = counter(
    "libvirt_domain_interface_stats_receive_packets_total",
    "Number of packets received on a network interface.",
    GUEST_DEVICE,
);
pub const IFACE_RX_ERRORS: MetricDesc = counter(
    "libvirt_domain_interface_stats_receive_errors_total",
    "Number of packet receive errors on a network interface.",
    GUEST_DEVICE,
);
pub const IFACE_RX_DROPS: MetricDesc = counter(
    "libvirt_domain_interface_stats_receive_drops_total",
    "Number of packet receive drops on a network interface.",
    GUEST_DEVICE,
);
pub const IFACE_TX_BYTES: MetricDesc = counter(
    "libvirt_domain_interface_stats_transmit_bytes_total",
    "Number of bytes transmitted on a network interface, in bytes.",
    GUEST_DEVICE,
);
pub const IFACE_TX_PACKETS: MetricDesc = counter(
    "libvirt_domain_interface_stats_transmit_packets_total",
    "Number of packets transmitted on a network interface.",
    GUEST_DEVICE,
);
pub const IFACE_TX_ERRORS: MetricDesc = counter(
    "libvirt_domain_interface_stats_transmit_errors_total",
    "Number of packet transmit errors on a network interface.",
    GUEST_DEVICE,
);
pub const IFACE_TX_DROPS: MetricDesc = counter(
    "libvirt_domain_interface_stats_transmit_drops_total",
    "Number of packet transmit drops on a network interface.",
    GUEST_DEVICE,
);

// Balloon memory
pub const MEM_MAJOR_FAULT: MetricDesc = counter(
    "libvirt_domain_memory_stats_major_fault_total",
    "Page faults that required disk I/O to service.",
    GUEST,
);
pub const MEM_MINOR_FAULT: MetricDesc = counter(
    "libvirt_domain_memory_stats_minor_fault_total",
    "Page faults serviced without disk I/O.",
    GUEST,
);
pub const MEM_UNUSED: MetricDesc = gauge(
    "libvirt_domain_memory_stats_unused_bytes",
    "Memory left completely unused by the guest, excluding reclaimable caches, in bytes.",
    GUEST,
);
pub const MEM_AVAILABLE: MetricDesc = gauge(
    "libvirt_domain_memory_stats_available_bytes",
    "Total usable memory as seen by the guest, in bytes.",
    GUEST,
);
pub const MEM_ACTUAL_BALLOON: MetricDesc = gauge(
    "libvirt_domain_memory_stats_actual_balloon_bytes",
    "Current balloon value, in bytes.",
    GUEST,
);
pub const MEM_RSS: MetricDesc = gauge(
    "libvirt_domain_memory_stats_rss_bytes",
    "Resident set size of the process running the domain, in bytes.",
    GUEST,
);
pub const MEM_USABLE: MetricDesc = gauge(
    "libvirt_domain_memory_stats_usable_bytes",
    "How much the balloon can be inflated without pushing the guest to swap, in bytes.",
    GUEST,
);
pub const MEM_DISK_CACHE: MetricDesc = gauge(
    "libvirt_domain_memory_stats_disk_cache_bytes",
    "Memory that can be reclaimed without additional I/O, in bytes.",
    GUEST,
);
pub const MEM_USED_PERCENT: MetricDesc = gauge(
    "libvirt_domain_memory_stats_used_percent",
    "Share of guest-visible memory in use, in percent.",
    GUEST,
);

// Storage pools
pub const POOL_STATE: MetricDesc = gauge(
    "libvirt_storage_pool_info_state",
    "Storage pool state. 0: inactive, 1: building, 2: running, 3: degraded, 4: inaccessible.",
    POOL,
);
pub const POOL_CAPACITY: MetricDesc = gauge(
    "libvirt_storage_pool_info_capacity_bytes",
    "Logical size of the storage pool, in bytes.",
    POOL,
);
pub const POOL_ALLOCATION: MetricDesc = gauge(
    "libvirt_storage_pool_info_allocation_bytes",
    "Current allocation of the storage pool, in bytes.",
    POOL,
);
pub const POOL_AVAILABLE: MetricDesc = gauge(
    "libvirt_storage_pool_info_available_bytes",
    "Remaining free space in the storage pool, in bytes.",
    POOL,
);

/// All descriptors, in exposition order.
pub const ALL: &[&MetricDesc] = &[
    &UP,
    &VERSIONS_INFO,
    &DOMAIN_META,
    &DOMAIN_MAX_MEMORY,
    &DOMAIN_MEMORY_USAGE,
    &DOMAIN_VIRTUAL_CPUS,
    &DOMAIN_CPU_TIME,
    &DOMAIN_STATE,
    &VCPU_STATE,
    &VCPU_TIME,
    &VCPU_CPU,
    &VCPU_WAIT,
    &VCPU_DELAY,
    &BLOCK_META,
    &BLOCK_READ_BYTES,
    &BLOCK_READ_REQUESTS,
    &BLOCK_READ_TIME,
    &BLOCK_WRITE_BYTES,
    &BLOCK_WRITE_REQUESTS,
    &BLOCK_WRITE_TIME,
    &BLOCK_FLUSH_REQUESTS,
    &BLOCK_FLUSH_TIME,
    &BLOCK_ALLOCATION,
    &BLOCK_CAPACITY,
    &BLOCK_PHYSICAL,
    &LIMIT_TOTAL_BYTES,
    &LIMIT_WRITE_BYTES,
    &LIMIT_READ_BYTES,
    &LIMIT_TOTAL_REQUESTS,
    &LIMIT_WRITE_REQUESTS,
    &LIMIT_READ_REQUESTS,
    &LIMIT_BURST_TOTAL_BYTES,
    &LIMIT_BURST_WRITE_BYTES,
    &LIMIT_BURST_READ_BYTES,
    &LIMIT_BURST_TOTAL_REQUESTS,
    &LIMIT_BURST_WRITE_REQUESTS,
    &LIMIT_BURST_READ_REQUESTS,
    &LIMIT_BURST_TOTAL_BYTES_LENGTH,
    &LIMIT_BURST_WRITE_BYTES_LENGTH,
    &LIMIT_BURST_READ_BYTES_LENGTH,
    &LIMIT_BURST_TOTAL_REQUESTS_LENGTH,
    &LIMIT_BURST_WRITE_REQUESTS_LENGTH,
    &LIMIT_BURST_READ_REQUESTS_LENGTH,
    &LIMIT_SIZE_IOPS,
    &INTERFACE_META,
    &IFACE_RX_BYTES,
    &IFACE_RX_PACKETS,
    &IFACE_RX_ERRORS,
    &IFACE_RX_DROPS,
    &IFACE_TX_BYTES,
    &IFACE_TX_PACKETS,
    &IFACE_TX_ERRORS,
    &IFACE_TX_DROPS,
    &MEM_MAJOR_FAULT,
    &MEM_MINOR_FAULT,
    &MEM_UNUSED,
    &MEM_AVAILABLE,
    &MEM_ACTUAL_BALLOON,
    &MEM_RSS,
    &MEM_USABLE,
    &MEM_DISK_CACHE,
    &MEM_USED_PERCENT,
    &POOL_STATE,
    &POOL_CAPACITY,
    &POOL_ALLOCATION,
    &POOL_AVAILABLE,
];
