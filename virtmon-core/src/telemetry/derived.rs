//! Measurements computed from, rather than copied out of, raw samples.

use super::descriptors as d;
use super::device_config::GuestMetadata;
use super::measurement::Measurement;
use super::projector::{project, MemoryStats, Unit, MEMORY_FIELDS, VCPU_FIELDS};
use crate::hypervisor::types::{GuestInfo, HostVersions, VcpuInfo, VcpuStats};

/// Percentage of guest-visible memory in use.
///
/// Zero when either input is missing or zero. A zero reading cannot be
/// told apart from "no data"; dashboards already rely on this.
pub fn used_percent(available: Option<u64>, usable: Option<u64>) -> f64 {
    match (available, usable) {
        (Some(available), Some(usable)) if available != 0 && usable != 0 => {
            (available as f64 - usable as f64) / (available as f64 / 100.0)
        }
        _ => 0.0,
    }
}

/// Render a packed version (`major * 1_000_000 + minor * 1_000 + release`).
pub fn format_version(packed: u64) -> String {
    format!("{}.{}.{}", packed / 1_000_000 % 1000, packed / 1000 % 1000, packed % 1000)
}

pub fn up(ok: bool) -> Measurement {
    Measurement::new(&d::UP, if ok { 1.0 } else { 0.0 }, Vec::new())
}

pub fn versions_info(versions: &HostVersions) -> Measurement {
    Measurement::new(
        &d::VERSIONS_INFO,
        1.0,
        vec![
            format_version(versions.hypervisor),
            format_version(versions.daemon),
            format_version(versions.library),
        ],
    )
}

/// Metadata series plus basic info gauges of one guest.
pub fn guest_info_measurements(
    guest: &str,
    uuid: &str,
    metadata: &GuestMetadata,
    info: &GuestInfo,
) -> Vec<Measurement> {
    let labels = || vec![guest.to_string()];
    vec![
        Measurement::new(
            &d::DOMAIN_META,
            1.0,
            vec![
                guest.to_string(),
                uuid.to_string(),
                metadata.instance_name.clone(),
                metadata.flavor_name.clone(),
                metadata.owner_user_name.clone(),
                metadata.owner_user_uuid.clone(),
                metadata.owner_project_name.clone(),
                metadata.owner_project_uuid.clone(),
                metadata.root_type.clone(),
                metadata.root_uuid.clone(),
            ],
        ),
        Measurement::new(
            &d::DOMAIN_MAX_MEMORY,
            Unit::Kibibytes.normalize(info.max_memory_kib),
            labels(),
        ),
        Measurement::new(
            &d::DOMAIN_MEMORY_USAGE,
            Unit::Kibibytes.normalize(info.memory_kib),
            labels(),
        ),
        Measurement::new(&d::DOMAIN_VIRTUAL_CPUS, info.nr_virt_cpu as f64, labels()),
        Measurement::new(
            &d::DOMAIN_CPU_TIME,
            Unit::Nanoseconds.normalize(info.cpu_time_ns),
            labels(),
        ),
        Measurement::new(&d::DOMAIN_STATE, info.state as f64, labels()),
    ]
}

/// Per-vCPU series. `stats` is indexed by vCPU number and may be shorter
/// than `vcpus`.
pub fn vcpu_measurements(guest: &str, vcpus: &[VcpuInfo], stats: &[VcpuStats]) -> Vec<Measurement> {
    let mut out = Vec::with_capacity(vcpus.len() * 5);
    for vcpu in vcpus {
        let number = vcpu.number.to_string();
        let labels = || vec![guest.to_string(), number.clone()];
        out.push(Measurement::new(&d::VCPU_STATE, vcpu.state as f64, labels()));
        let time = Unit::Nanoseconds.normalize(vcpu.cpu_time_ns);
        out.push(Measurement::new(&d::VCPU_TIME, time, labels()));
        out.push(Measurement::new(&d::VCPU_CPU, vcpu.cpu as f64, labels()));
        if let Some(sample) = stats.get(vcpu.number as usize) {
            out.extend(project(sample, VCPU_FIELDS, &[guest, number.as_str()]));
        }
    }
    out
}

/// Balloon series of one guest. `used_percent` is always emitted, even when
/// the statistics call was skipped (`stats == None`).
pub fn memory_measurements(guest: &str, stats: Option<&MemoryStats>) -> Vec<Measurement> {
    let mut out = match stats {
        Some(stats) => project(stats, MEMORY_FIELDS, &[guest]),
        None => Vec::new(),
    };
    let percent = stats.map(|s| used_percent(s.available, s.usable)).unwrap_or(0.0);
    out.push(Measurement::new(&d::MEM_USED_PERCENT, percent, vec![guest.to_string()]));
    out
}
