//! Joins live device statistics with the guest's declared devices.
//!
//! The join key is the target device name. Lookups scan the declared list
//! linearly; guests carry at most a few dozen devices.

use super::descriptors as d;
use super::device_config::{DeviceDescriptor, DiskConfig};
use super::measurement::Measurement;
use super::projector::{project, BLOCK_FIELDS, INTERFACE_FIELDS};
use crate::hypervisor::types::{BlockStats, InterfaceStats};

/// Emulated IDE slots conventionally holding CD-ROMs; never reported.
const EXCLUDED_DISKS: &[&str] = &["hda", "hdc"];

/// Whether a live disk participates in disk reporting.
pub fn is_reported_disk(disk: &BlockStats) -> bool {
    !EXCLUDED_DISKS.contains(&disk.name.as_str())
}

/// Live disks that produce measurements, in sample order.
pub fn reported_disks(disks: &[BlockStats]) -> impl Iterator<Item = &BlockStats> {
    disks.iter().filter(|d| is_reported_disk(d))
}

/// Metadata measurement plus projected counters for one live disk.
///
/// Excluded disks yield nothing. A disk missing from the descriptor still
/// gets its metadata series, with empty configuration labels.
pub fn disk_measurements(
    guest: &str,
    disk: &BlockStats,
    descriptor: &DeviceDescriptor,
) -> Vec<Measurement> {
    if !is_reported_disk(disk) {
        return Vec::new();
    }

    let declared = descriptor.find_disk(&disk.name);
    let from_config = |pick: fn(&DiskConfig) -> &str| {
        declared.map(pick).unwrap_or_default().to_string()
    };

    let source = match disk.path.as_deref() {
        Some(path) => path.to_string(),
        None => from_config(|c| c.source_name.as_str()),
    };

    let mut out = Vec::with_capacity(1 + BLOCK_FIELDS.len());
    out.push(Measurement::new(
        &d::BLOCK_META,
        1.0,
        vec![
            guest.to_string(),
            disk.name.clone(),
            source,
            from_config(|c| c.serial.as_str()),
            from_config(|c| c.bus.as_str()),
            from_config(|c| c.disk_type.as_str()),
            from_config(|c| c.driver_type.as_str()),
            from_config(|c| c.cache_mode.as_str()),
            from_config(|c| c.discard_mode.as_str()),
        ],
    ));
    out.extend(project(disk, BLOCK_FIELDS, &[guest, disk.name.as_str()]));
    out
}

/// Metadata (when informative) plus projected counters for one live interface.
pub fn interface_measurements(
    guest: &str,
    iface: &InterfaceStats,
    descriptor: &DeviceDescriptor,
) -> Vec<Measurement> {
    let mut out = Vec::with_capacity(1 + INTERFACE_FIELDS.len());
    if let Some(declared) = descriptor.find_interface(&iface.name) {
        if !declared.source_bridge.is_empty() || !declared.virtual_port_id.is_empty() {
            out.push(Measurement::new(
                &d::INTERFACE_META,
                1.0,
                vec![
                    guest.to_string(),
                    declared.source_bridge.clone(),
                    iface.name.clone(),
                    declared.virtual_port_id.clone(),
                ],
            ));
        }
    }
    out.extend(project(iface, INTERFACE_FIELDS, &[guest, iface.name.as_str()]));
    out
}
