//! Typed parameter lists as returned by libvirt's bulk stats and IO-tune calls.
//!
//! The mapping into [`GuestStats`] and [`BlockIoTune`] works on owned
//! key/value pairs so it can be tested without a hypervisor.

use crate::hypervisor::types::{BlockIoTune, BlockStats, GuestStats, InterfaceStats, VcpuStats};
use std::collections::HashMap;

/// One decoded `virTypedParameter` value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    UInt(u64),
    Double(f64),
    Bool(bool),
    String(String),
}

impl ParamValue {
    fn as_u64(&self) -> Option<u64> {
        match self {
            ParamValue::Int(v) => u64::try_from(*v).ok(),
            ParamValue::UInt(v) => Some(*v),
            ParamValue::Double(v) if *v >= 0.0 => Some(*v as u64),
            ParamValue::Bool(v) => Some(u64::from(*v)),
            _ => None,
        }
    }
}

/// Named parameters of one record. Later duplicates win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedParams(HashMap<String, ParamValue>);

impl FromIterator<(String, ParamValue)> for TypedParams {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl TypedParams {
    /// Numeric value of `key`; `None` when absent or not numeric.
    pub fn num(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(ParamValue::as_u64)
    }

    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key) {
            Some(ParamValue::String(s)) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Build one guest's snapshot from its `virConnectGetAllDomainStats` record.
pub fn guest_stats(name: String, params: &TypedParams) -> GuestStats {
    let block = (0..params.num("block.count").unwrap_or(0))
        .map(|i| {
            let k = |field: &str| format!("block.{}.{}", i, field);
            BlockStats {
                name: params.text(&k("name")).unwrap_or_default(),
                path: params.text(&k("path")),
                rd_reqs: params.num(&k("rd.reqs")),
                rd_bytes: params.num(&k("rd.bytes")),
                rd_times: params.num(&k("rd.times")),
                wr_reqs: params.num(&k("wr.reqs")),
                wr_bytes: params.num(&k("wr.bytes")),
                wr_times: params.num(&k("wr.times")),
                fl_reqs: params.num(&k("fl.reqs")),
                fl_times: params.num(&k("fl.times")),
                allocation: params.num(&k("allocation")),
                capacity: params.num(&k("capacity")),
                physical: params.num(&k("physical")),
            }
        })
        .collect();

    let net = (0..params.num("net.count").unwrap_or(0))
        .map(|i| {
            let k = |field: &str| format!("net.{}.{}", i, field);
            InterfaceStats {
                name: params.text(&k("name")).unwrap_or_default(),
                rx_bytes: params.num(&k("rx.bytes")),
                rx_pkts: params.num(&k("rx.pkts")),
                rx_errs: params.num(&k("rx.errs")),
                rx_drop: params.num(&k("rx.drop")),
                tx_bytes: params.num(&k("tx.bytes")),
                tx_pkts: params.num(&k("tx.pkts")),
                tx_errs: params.num(&k("tx.errs")),
                tx_drop: params.num(&k("tx.drop")),
            }
        })
        .collect();

    let vcpu_count = params.num("vcpu.maximum").or_else(|| params.num("vcpu.current"));
    let vcpu = (0..vcpu_count.unwrap_or(0))
        .map(|i| {
            let k = |field: &str| format!("vcpu.{}.{}", i, field);
            VcpuStats {
                state: params.num(&k("state")),
                time: params.num(&k("time")),
                wait: params.num(&k("wait")),
                delay: params.num(&k("delay")),
            }
        })
        .collect();

    GuestStats { name, block, net, vcpu }
}

/// Map `virDomainGetBlockIoTune` parameters. Unknown names (e.g. `group_name`)
/// are ignored.
pub fn block_io_tune(params: &TypedParams) -> BlockIoTune {
    let p = |key: &str| params.num(key);
    BlockIoTune {
        total_bytes_sec: p("total_bytes_sec"),
        read_bytes_sec: p("read_bytes_sec"),
        write_bytes_sec: p("write_bytes_sec"),
        total_iops_sec: p("total_iops_sec"),
        read_iops_sec: p("read_iops_sec"),
        write_iops_sec: p("write_iops_sec"),
        total_bytes_sec_max: p("total_bytes_sec_max"),
        read_bytes_sec_max: p("read_bytes_sec_max"),
        write_bytes_sec_max: p("write_bytes_sec_max"),
        total_iops_sec_max: p("total_iops_sec_max"),
        read_iops_sec_max: p("read_iops_sec_max"),
        write_iops_sec_max: p("write_iops_sec_max"),
        total_bytes_sec_max_length: p("total_bytes_sec_max_length"),
        read_bytes_sec_max_length: p("read_bytes_sec_max_length"),
        write_bytes_sec_max_length: p("write_bytes_sec_max_length"),
        total_iops_sec_max_length: p("total_iops_sec_max_length"),
        read_iops_sec_max_length: p("read_iops_sec_max_length"),
        write_iops_sec_max_length: p("write_iops_sec_max_length"),
        size_iops_sec: p("size_iops_sec"),
    }
}
