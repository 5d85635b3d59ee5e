//! Presence-gated projection of raw samples into measurements.
//!
//! Each sample type has a field table: which series a raw field feeds, the
//! unit it arrives in, and how to read it. Only fields the hypervisor
//! actually reported are emitted; an absent field never becomes a zero.

use super::descriptors as d;
use super::measurement::{MetricDesc, Measurement};
use crate::hypervisor::types::{BlockIoTune, BlockStats, InterfaceStats, MemoryStat, VcpuStats};

/// Unit a raw value arrives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Dimensionless count or already canonical (bytes, seconds).
    Raw,
    Kibibytes,
    Nanoseconds,
}

impl Unit {
    /// Convert to bytes / seconds.
    pub fn normalize(self, raw: u64) -> f64 {
        match self {
            Unit::Raw => raw as f64,
            Unit::Kibibytes => raw as f64 * 1024.0,
            Unit::Nanoseconds => raw as f64 / 1e9,
        }
    }
}

/// One row of a field table.
pub struct Field<S> {
    pub desc: &'static MetricDesc,
    pub unit: Unit,
    pub read: fn(&S) -> Option<u64>,
}

/// Emit one measurement per present field of `sample`.
pub fn project<S>(sample: &S, fields: &[Field<S>], label_values: &[&str]) -> Vec<Measurement> {
    fields
        .iter()
        .filter_map(|field| {
            let raw = (field.read)(sample)?;
            let labels = label_values.iter().map(|v| v.to_string()).collect();
            Some(Measurement::new(field.desc, field.unit.normalize(raw), labels))
        })
        .collect()
}

pub const BLOCK_FIELDS: &[Field<BlockStats>] = &[
    Field { desc: &d::BLOCK_READ_BYTES, unit: Unit::Raw, read: |s| s.rd_bytes },
    Field { desc: &d::BLOCK_READ_REQUESTS, unit: Unit::Raw, read: |s| s.rd_reqs },
    Field { desc: &d::BLOCK_READ_TIME, unit: Unit::Nanoseconds, read: |s| s.rd_times },
    Field { desc: &d::BLOCK_WRITE_BYTES, unit: Unit::Raw, read: |s| s.wr_bytes },
    Field { desc: &d::BLOCK_WRITE_REQUESTS, unit: Unit::Raw, read: |s| s.wr_reqs },
    Field { desc: &d::BLOCK_WRITE_TIME, unit: Unit::Nanoseconds, read: |s| s.wr_times },
    Field { desc: &d::BLOCK_FLUSH_REQUESTS, unit: Unit::Raw, read: |s| s.fl_reqs },
    Field { desc: &d::BLOCK_FLUSH_TIME, unit: Unit::Nanoseconds, read: |s| s.fl_times },
    Field { desc: &d::BLOCK_ALLOCATION, unit: Unit::Raw, read: |s| s.allocation },
    Field { desc: &d::BLOCK_CAPACITY, unit: Unit::Raw, read: |s| s.capacity },
    Field { desc: &d::BLOCK_PHYSICAL, unit: Unit::Raw, read: |s| s.physical },
];

pub const INTERFACE_FIELDS: &[Field<InterfaceStats>] = &[
    Field { desc: &d::IFACE_RX_BYTES, unit: Unit::Raw, read: |s| s.rx_bytes },
    Field { desc: &d::IFACE_RX_PACKETS, unit: Unit::Raw, read: |s| s.rx_pkts },
    Field { desc: &d::IFACE_RX_ERRORS, unit: Unit::Raw, read: |s| s.rx_errs },
    Field { desc: &d::IFACE_RX_DROPS, unit: Unit::Raw, read: |s| s.rx_drop },
    Field { desc: &d::IFACE_TX_BYTES, unit: Unit::Raw, read: |s| s.tx_bytes },
    Field { desc: &d::IFACE_TX_PACKETS, unit: Unit::Raw, read: |s| s.tx_pkts },
    Field { desc: &d::IFACE_TX_ERRORS, unit: Unit::Raw, read: |s| s.tx_errs },
    Field { desc: &d::IFACE_TX_DROPS, unit: Unit::Raw, read: |s| s.tx_drop },
];

pub const VCPU_FIELDS: &[Field<VcpuStats>] = &[
    Field { desc: &d::VCPU_WAIT, unit: Unit::Nanoseconds, read: |s| s.wait },
    Field { desc: &d::VCPU_DELAY, unit: Unit::Nanoseconds, read: |s| s.delay },
];

// The `_max_length` burst durations are already seconds.
pub const IO_TUNE_FIELDS: &[Field<BlockIoTune>] = &[
    Field { desc: &d::LIMIT_TOTAL_BYTES, unit: Unit::Raw, read: |t| t.total_bytes_sec },
    Field { desc: &d::LIMIT_WRITE_BYTES, unit: Unit::Raw, read: |t| t.write_bytes_sec },
    Field { desc: &d::LIMIT_READ_BYTES, unit: Unit::Raw, read: |t| t.read_bytes_sec },
    Field { desc: &d::LIMIT_TOTAL_REQUESTS, unit: Unit::Raw, read: |t| t.total_iops_sec },
    Field { desc: &d::LIMIT_WRITE_REQUESTS, unit: Unit::Raw, read: |t| t.write_iops_sec },
    Field { desc: &d::LIMIT_READ_REQUESTS, unit: Unit::Raw, read: |t| t.read_iops_sec },
    Field { desc: &d::LIMIT_BURST_TOTAL_BYTES, unit: Unit::Raw, read: |t| t.total_bytes_sec_max },
    Field { desc: &d::LIMIT_BURST_WRITE_BYTES, unit: Unit::Raw, read: |t| t.write_bytes_sec_max },
    Field { desc: &d::LIMIT_BURST_READ_BYTES, unit: Unit::Raw, read: |t| t.read_bytes_sec_max },
    Field { desc: &d::LIMIT_BURST_TOTAL_REQUESTS, unit: Unit::Raw, read: |t| t.total_iops_sec_max },
    Field { desc: &d::LIMIT_BURST_WRITE_REQUESTS, unit: Unit::Raw, read: |t| t.write_iops_sec_max },
    Field { desc: &d::LIMIT_BURST_READ_REQUESTS, unit: Unit::Raw, read: |t| t.read_iops_sec_max },
    Field {
        desc: &d::LIMIT_BURST_TOTAL_BYTES_LENGTH,
        unit: Unit::Raw,
        read: |t| t.total_bytes_sec_max_length,
    },
    Field {
        desc: &d::LIMIT_BURST_WRITE_BYTES_LENGTH,
        unit: Unit::Raw,
        read: |t| t.write_bytes_sec_max_length,
    },
    Field {
        desc: &d::LIMIT_BURST_READ_BYTES_LENGTH,
        unit: Unit::Raw,
        read: |t| t.read_bytes_sec_max_length,
    },
    Field {
        desc: &d::LIMIT_BURST_TOTAL_REQUESTS_LENGTH,
        unit: Unit::Raw,
        read: |t| t.total_iops_sec_max_length,
    },
    Field {
        desc: &d::LIMIT_BURST_WRITE_REQUESTS_LENGTH,
        unit: Unit::Raw,
        read: |t| t.write_iops_sec_max_length,
    },
    Field {
        desc: &d::LIMIT_BURST_READ_REQUESTS_LENGTH,
        unit: Unit::Raw,
        read: |t| t.read_iops_sec_max_length,
    },
    Field { desc: &d::LIMIT_SIZE_IOPS, unit: Unit::Raw, read: |t| t.size_iops_sec },
];

/// Balloon statistics folded from the tagged sequence. Sizes stay in KiB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub major_fault: Option<u64>,
    pub minor_fault: Option<u64>,
    pub unused: Option<u64>,
    pub available: Option<u64>,
    pub actual_balloon: Option<u64>,
    pub rss: Option<u64>,
    pub usable: Option<u64>,
    pub disk_caches: Option<u64>,
}

impl MemoryStats {
    /// Fold tagged values. Unknown tags are ignored; a repeated tag keeps its last value.
    pub fn from_tagged(stats: &[MemoryStat]) -> Self {
        let mut folded = Self::default();
        for stat in stats {
            let slot = match stat.tag {
                MemoryStat::MAJOR_FAULT => &mut folded.major_fault,
                MemoryStat::MINOR_FAULT => &mut folded.minor_fault,
                MemoryStat::UNUSED => &mut folded.unused,
                MemoryStat::AVAILABLE => &mut folded.available,
                MemoryStat::ACTUAL_BALLOON => &mut folded.actual_balloon,
                MemoryStat::RSS => &mut folded.rss,
                MemoryStat::USABLE => &mut folded.usable,
                MemoryStat::DISK_CACHES => &mut folded.disk_caches,
                _ => continue,
            };
            *slot = Some(stat.value);
        }
        folded
    }
}

pub const MEMORY_FIELDS: &[Field<MemoryStats>] = &[
    Field { desc: &d::MEM_MAJOR_FAULT, unit: Unit::Raw, read: |m| m.major_fault },
    Field { desc: &d::MEM_MINOR_FAULT, unit: Unit::Raw, read: |m| m.minor_fault },
    Field { desc: &d::MEM_UNUSED, unit: Unit::Kibibytes, read: |m| m.unused },
    Field { desc: &d::MEM_AVAILABLE, unit: Unit::Kibibytes, read: |m| m.available },
    Field { desc: &d::MEM_ACTUAL_BALLOON, unit: Unit::Kibibytes, read: |m| m.actual_balloon },
    Field { desc: &d::MEM_RSS, unit: Unit::Kibibytes, read: |m| m.rss },
    Field { desc: &d::MEM_USABLE, unit: Unit::Kibibytes, read: |m| m.usable },
    Field { desc: &d::MEM_DISK_CACHE, unit: Unit::Kibibytes, read: |m| m.disk_caches },
];
