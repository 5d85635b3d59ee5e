//! Failure classification for per-guest measurement groups.
//!
//! Hypervisor errors are classified in exactly one place, [`classify`].
//! Optional groups (vCPU info, I/O throttling, balloon stats) absorb soft
//! failures through [`FailureIsolation::absorb`]; everything else aborts the
//! guest.

use crate::hypervisor::{ErrorCode, HvResult, HypervisorError};
use crate::observability::metrics;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// What a failed hypervisor call means for the measurement group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The host cannot provide this group. Warn once per process, skip.
    Unsupported,
    /// The guest's state does not allow the call. Log, skip.
    InvalidState,
    /// Abort collection for this guest.
    Fatal,
}

/// The single mapping from hypervisor error codes to dispositions.
pub fn classify(err: &HypervisorError) -> Disposition {
    match err.code {
        ErrorCode::OperationUnsupported | ErrorCode::NoSupport => Disposition::Unsupported,
        ErrorCode::OperationInvalid => Disposition::InvalidState,
        ErrorCode::NoConnection | ErrorCode::Other => Disposition::Fatal,
    }
}

/// Optional per-guest measurement groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Vcpu,
    BlockIoTune,
    MemoryStats,
}

impl Group {
    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Vcpu => "vcpu",
            Group::BlockIoTune => "blkiotune",
            Group::MemoryStats => "memory_stats",
        }
    }

    /// Warning class used for once-per-process deduplication.
    pub fn unsupported_class(&self) -> String {
        format!("{}_unsupported", self.as_str())
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-lifetime set of warning classes already reported.
///
/// Cloning shares the set. Entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct WarningLog {
    reported: Arc<Mutex<HashSet<String>>>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `class`; returns `true` only the first time it is seen.
    pub fn first_occurrence(&self, class: &str) -> bool {
        // A poisoned set still holds valid entries.
        let mut reported = self.reported.lock().unwrap_or_else(|e| e.into_inner());
        if reported.contains(class) {
            return false;
        }
        reported.insert(class.to_string());
        true
    }

    pub fn contains(&self, class: &str) -> bool {
        self.reported.lock().unwrap_or_else(|e| e.into_inner()).contains(class)
    }

    pub fn len(&self) -> usize {
        self.reported.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Applies [`classify`] to optional groups, logging soft failures.
#[derive(Debug, Clone)]
pub struct FailureIsolation {
    warnings: WarningLog,
}

impl FailureIsolation {
    pub fn new(warnings: WarningLog) -> Self {
        Self { warnings }
    }

    pub fn warnings(&self) -> &WarningLog {
        &self.warnings
    }

    /// `Ok(Some(_))` on success, `Ok(None)` when the group should be
    /// skipped, `Err` when the guest must be abandoned.
    pub fn absorb<T>(&self, group: Group, guest: &str, result: HvResult<T>) -> HvResult<Option<T>> {
        let err = match result {
            Ok(value) => return Ok(Some(value)),
            Err(err) => err,
        };
        match classify(&err) {
            Disposition::Unsupported => {
                metrics::record_soft_failure(group.as_str(), "unsupported");
                let class = group.unsupported_class();
                if self.warnings.first_occurrence(&class) {
                    warn!(
                        class = %class,
                        guest = %guest,
                        error = %err,
                        "Hypervisor does not support {} collection; skipping it for all guests",
                        group
                    );
                }
                Ok(None)
            }
            Disposition::InvalidState => {
                metrics::record_soft_failure(group.as_str(), "invalid_state");
                info!(guest = %guest, group = %group, error = %err, "Skipping measurement group");
                Ok(None)
            }
            Disposition::Fatal => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(code: ErrorCode) -> HypervisorError {
        HypervisorError::new(code, "test")
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&err(ErrorCode::OperationUnsupported)), Disposition::Unsupported);
        assert_eq!(classify(&err(ErrorCode::NoSupport)), Disposition::Unsupported);
        assert_eq!(classify(&err(ErrorCode::OperationInvalid)), Disposition::InvalidState);
        assert_eq!(classify(&err(ErrorCode::NoConnection)), Disposition::Fatal);
        assert_eq!(classify(&err(ErrorCode::Other)), Disposition::Fatal);
    }

    #[test]
    fn test_warning_log_dedups() {
        let log = WarningLog::new();
        assert!(log.first_occurrence("blkiotune_unsupported"));
        assert!(!log.first_occurrence("blkiotune_unsupported"));
        assert!(log.first_occurrence("vcpu_unsupported"));
        assert_eq!(log.len(), 2);

        // Clones share state.
        let shared = log.clone();
        assert!(!shared.first_occurrence("vcpu_unsupported"));
    }

    #[test]
    fn test_warning_log_concurrent_first_occurrence() {
        let log = WarningLog::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let log = log.clone();
                std::thread::spawn(move || log.first_occurrence("vcpu_unsupported"))
            })
            .collect();
        let firsts = handles.into_iter().map(|h| h.join().unwrap()).filter(|first| *first).count();
        assert_eq!(firsts, 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_absorb() {
        let isolation = FailureIsolation::new(WarningLog::new());

        let ok: HvResult<u32> = Ok(7);
        assert_eq!(isolation.absorb(Group::Vcpu, "vm1", ok).unwrap(), Some(7));

        let unsupported: HvResult<u32> = Err(err(ErrorCode::OperationUnsupported));
        assert_eq!(isolation.absorb(Group::BlockIoTune, "vm1", unsupported).unwrap(), None);
        assert!(isolation.warnings().contains("blkiotune_unsupported"));

        let invalid: HvResult<u32> = Err(err(ErrorCode::OperationInvalid));
        assert_eq!(isolation.absorb(Group::MemoryStats, "vm1", invalid).unwrap(), None);
        assert!(!isolation.warnings().contains("memory_stats_unsupported"));

        let fatal: HvResult<u32> = Err(err(ErrorCode::Other));
        assert!(isolation.absorb(Group::Vcpu, "vm1", fatal).is_err());
    }
}
