//! libvirt calls that the `virt` bindings do not wrap with typed parameters.
//!
//! Every function here runs on a blocking thread and frees what libvirt
//! allocated before returning.

use super::params::{ParamValue, TypedParams};
use crate::hypervisor::types::{GuestStats, VcpuInfo};
use crate::hypervisor::{ErrorCode, HvResult, HypervisorError};
use bitflags::bitflags;
use std::ffi::{CStr, CString};
use std::os::raw::c_int;
use std::ptr;
use virt::connect::Connect;
use virt::domain::Domain;
use virt::error::Error as VirtError;
use virt::sys;

bitflags! {
    /// `virDomainStatsTypes` groups requested from the bulk stats call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct StatsTypes: u32 {
        const STATE = 0x1;
        const CPU_TOTAL = 0x2;
        const BALLOON = 0x4;
        const VCPU = 0x8;
        const INTERFACE = 0x10;
        const BLOCK = 0x20;
    }
}

bitflags! {
    /// `virConnectGetAllDomainStatsFlags` guest filters.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct StatsFilter: u32 {
        const RUNNING = 0x10;
        const SHUTOFF = 0x40;
    }
}

// virTypedParameterType
const PARAM_INT: u32 = 1;
const PARAM_UINT: u32 = 2;
const PARAM_LLONG: u32 = 3;
const PARAM_ULLONG: u32 = 4;
const PARAM_DOUBLE: u32 = 5;
const PARAM_BOOLEAN: u32 = 6;
const PARAM_STRING: u32 = 7;

fn last_error() -> HypervisorError {
    VirtError::last_error().into()
}

/// Decode `nparams` typed parameters starting at `params`.
///
/// # Safety
/// `params` must be null or point to `nparams` initialised parameters.
unsafe fn read_params(params: *const sys::virTypedParameter, nparams: c_int) -> TypedParams {
    if params.is_null() || nparams <= 0 {
        return TypedParams::default();
    }
    std::slice::from_raw_parts(params, nparams as usize)
        .iter()
        .filter_map(|param| {
            let name = CStr::from_ptr(param.field.as_ptr()).to_string_lossy().into_owned();
            let value = match param.type_ as u32 {
                PARAM_INT => ParamValue::Int(i64::from(param.value.i)),
                PARAM_UINT => ParamValue::UInt(u64::from(param.value.ui)),
                PARAM_LLONG => ParamValue::Int(param.value.l),
                PARAM_ULLONG => ParamValue::UInt(param.value.ul),
                PARAM_DOUBLE => ParamValue::Double(param.value.d),
                PARAM_BOOLEAN => ParamValue::Bool(param.value.b != 0),
                PARAM_STRING if !param.value.s.is_null() => ParamValue::String(
                    CStr::from_ptr(param.value.s).to_string_lossy().into_owned(),
                ),
                _ => return None,
            };
            Some((name, value))
        })
        .collect()
}

/// Bulk statistics of running and shut-off guests.
pub fn all_domain_stats(conn: &Connect) -> HvResult<Vec<GuestStats>> {
    let types = StatsTypes::STATE
        | StatsTypes::CPU_TOTAL
        | StatsTypes::BALLOON
        | StatsTypes::VCPU
        | StatsTypes::INTERFACE
        | StatsTypes::BLOCK;
    let filter = StatsFilter::RUNNING | StatsFilter::SHUTOFF;

    let mut records: *mut sys::virDomainStatsRecordPtr = ptr::null_mut();
    // SAFETY: `records` receives a NULL-terminated list owned by us until
    // virDomainStatsRecordListFree.
    let count = unsafe {
        sys::virConnectGetAllDomainStats(conn.as_ptr(), types.bits(), &mut records, filter.bits())
    };
    if count < 0 {
        return Err(last_error());
    }
    if records.is_null() {
        return Ok(Vec::new());
    }

    // SAFETY: libvirt returned `count` valid record pointers.
    let guests = unsafe {
        std::slice::from_raw_parts(records, count as usize)
            .iter()
            .filter(|record| !record.is_null())
            .filter_map(|&record| {
                let record = &*record;
                let name = sys::virDomainGetName(record.dom);
                if name.is_null() {
                    return None;
                }
                let name = CStr::from_ptr(name).to_string_lossy().into_owned();
                Some(super::params::guest_stats(name, &read_params(record.params, record.nparams)))
            })
            .collect()
    };

    // SAFETY: frees the list and the domain references it holds.
    unsafe { sys::virDomainStatsRecordListFree(records) };
    Ok(guests)
}

/// Scheduling information of the guest's first `count` vCPUs.
pub fn vcpus(domain: &Domain, count: u32) -> HvResult<Vec<VcpuInfo>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    // SAFETY: plain C struct; zero is a valid bit pattern.
    let mut info: Vec<sys::virVcpuInfo> =
        (0..count).map(|_| unsafe { std::mem::zeroed() }).collect();

    // SAFETY: `info` holds `count` entries; no CPU maps are requested.
    let filled = unsafe {
        sys::virDomainGetVcpus(
            domain.as_ptr(),
            info.as_mut_ptr(),
            count as c_int,
            ptr::null_mut(),
            0,
        )
    };
    if filled < 0 {
        return Err(last_error());
    }
    info.truncate(filled as usize);

    Ok(info
        .iter()
        .map(|v| VcpuInfo { number: v.number, state: v.state, cpu_time_ns: v.cpuTime, cpu: v.cpu })
        .collect())
}

/// IO throttling parameters of one disk.
pub fn block_io_tune(domain: &Domain, disk: &str) -> HvResult<TypedParams> {
    let disk = CString::new(disk).map_err(|_| {
        HypervisorError::new(ErrorCode::Other, format!("Invalid disk name: {:?}", disk))
    })?;

    let mut nparams: c_int = 0;
    // SAFETY: a NULL parameter array asks libvirt for the count only.
    let ret = unsafe {
        sys::virDomainGetBlockIoTune(
            domain.as_ptr(),
            disk.as_ptr(),
            ptr::null_mut(),
            &mut nparams,
            0,
        )
    };
    if ret < 0 {
        return Err(last_error());
    }
    if nparams <= 0 {
        return Ok(TypedParams::default());
    }

    // SAFETY: plain C struct; zero is a valid bit pattern.
    let mut params: Vec<sys::virTypedParameter> =
        (0..nparams).map(|_| unsafe { std::mem::zeroed() }).collect();
    // SAFETY: `params` holds `nparams` entries.
    let ret = unsafe {
        sys::virDomainGetBlockIoTune(
            domain.as_ptr(),
            disk.as_ptr(),
            params.as_mut_ptr(),
            &mut nparams,
            0,
        )
    };
    if ret < 0 {
        return Err(last_error());
    }

    // SAFETY: libvirt filled `nparams` entries; clearing frees their strings.
    let values = unsafe { read_params(params.as_ptr(), nparams) };
    unsafe { sys::virTypedParamsClear(params.as_mut_ptr(), nparams) };
    Ok(values)
}
