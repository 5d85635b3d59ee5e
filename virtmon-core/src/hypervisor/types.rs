//! Raw samples as returned by the hypervisor.
//!
//! Numeric fields the hypervisor may omit are `Option`s: `None` means the
//! value was not reported, which is different from a reported zero.

/// Packed version numbers (`major * 1_000_000 + minor * 1_000 + release`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostVersions {
    pub hypervisor: u64,
    pub daemon: u64,
    pub library: u64,
}

/// Bulk statistics snapshot of one guest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuestStats {
    pub name: String,
    pub block: Vec<BlockStats>,
    pub net: Vec<InterfaceStats>,
    /// Indexed by vCPU number.
    pub vcpu: Vec<VcpuStats>,
}

/// Live statistics of one disk. Times are nanoseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockStats {
    /// Target device name, e.g. `vda`.
    pub name: String,
    /// Backing path, when the hypervisor reports one.
    pub path: Option<String>,
    pub rd_reqs: Option<u64>,
    pub rd_bytes: Option<u64>,
    pub rd_times: Option<u64>,
    pub wr_reqs: Option<u64>,
    pub wr_bytes: Option<u64>,
    pub wr_times: Option<u64>,
    pub fl_reqs: Option<u64>,
    pub fl_times: Option<u64>,
    pub allocation: Option<u64>,
    pub capacity: Option<u64>,
    pub physical: Option<u64>,
}

/// Live statistics of one network interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceStats {
    /// Host-side device name, e.g. `vnet0`.
    pub name: String,
    pub rx_bytes: Option<u64>,
    pub rx_pkts: Option<u64>,
    pub rx_errs: Option<u64>,
    pub rx_drop: Option<u64>,
    pub tx_bytes: Option<u64>,
    pub tx_pkts: Option<u64>,
    pub tx_errs: Option<u64>,
    pub tx_drop: Option<u64>,
}

/// Bulk-stats view of one vCPU. Times are nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VcpuStats {
    pub state: Option<u64>,
    pub time: Option<u64>,
    pub wait: Option<u64>,
    pub delay: Option<u64>,
}

/// Basic guest information; always complete when the call succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuestInfo {
    pub state: u8,
    pub max_memory_kib: u64,
    pub memory_kib: u64,
    pub nr_virt_cpu: u32,
    pub cpu_time_ns: u64,
}

/// Scheduling information of one vCPU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VcpuInfo {
    pub number: u32,
    pub state: i32,
    pub cpu_time_ns: u64,
    /// Physical CPU the vCPU runs on, -1 when offline.
    pub cpu: i32,
}

/// I/O throttling limits of one disk. `None` for limits the host does not report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockIoTune {
    pub total_bytes_sec: Option<u64>,
    pub read_bytes_sec: Option<u64>,
    pub write_bytes_sec: Option<u64>,
    pub total_iops_sec: Option<u64>,
    pub read_iops_sec: Option<u64>,
    pub write_iops_sec: Option<u64>,
    pub total_bytes_sec_max: Option<u64>,
    pub read_bytes_sec_max: Option<u64>,
    pub write_bytes_sec_max: Option<u64>,
    pub total_iops_sec_max: Option<u64>,
    pub read_iops_sec_max: Option<u64>,
    pub write_iops_sec_max: Option<u64>,
    /// Burst durations in seconds.
    pub total_bytes_sec_max_length: Option<u64>,
    pub read_bytes_sec_max_length: Option<u64>,
    pub write_bytes_sec_max_length: Option<u64>,
    pub total_iops_sec_max_length: Option<u64>,
    pub read_iops_sec_max_length: Option<u64>,
    pub write_iops_sec_max_length: Option<u64>,
    pub size_iops_sec: Option<u64>,
}

/// One tagged balloon statistic. Sizes are KiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStat {
    pub tag: i32,
    pub value: u64,
}

impl MemoryStat {
    pub const SWAP_IN: i32 = 0;
    pub const SWAP_OUT: i32 = 1;
    pub const MAJOR_FAULT: i32 = 2;
    pub const MINOR_FAULT: i32 = 3;
    pub const UNUSED: i32 = 4;
    pub const AVAILABLE: i32 = 5;
    pub const ACTUAL_BALLOON: i32 = 6;
    pub const RSS: i32 = 7;
    pub const USABLE: i32 = 8;
    pub const LAST_UPDATE: i32 = 9;
    pub const DISK_CACHES: i32 = 10;

    pub fn new(tag: i32, value: u64) -> Self {
        Self { tag, value }
    }
}

/// Storage pool state and sizes in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoragePoolInfo {
    pub state: u8,
    pub capacity: u64,
    pub allocation: u64,
    pub available: u64,
}
