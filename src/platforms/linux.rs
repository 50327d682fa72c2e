//! Linux memory usage backend
//!
//! System totals come from `sysinfo(2)`; the calling process's own figures
//! are scanned from `/proc/self/status`. Only `sysinfo` is essential: a
//! status file that is unreadable or lacks a label degrades the affected
//! field to zero.

use std::io;
#[cfg(any(target_os = "linux", target_os = "android"))]
use std::path::PathBuf;

use log::{debug, warn};

use crate::error::Result;
use crate::models::MemoryUsageSnapshot;
use crate::platforms::common::ProcessStatusMemory;
use crate::platforms::MemoryProbe;

/// The `sysinfo(2)` fields the snapshot needs, in `mem_unit` units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SysinfoTotals {
    pub total_ram: u64,
    pub free_ram: u64,
    pub total_swap: u64,
    pub free_swap: u64,
    pub mem_unit: u64,
}

impl SysinfoTotals {
    fn unit(&self) -> u64 {
        // Kernels before 2.3.23 leave mem_unit at zero and report bytes
        self.mem_unit.max(1)
    }

    fn used_ram(&self) -> u64 {
        self.total_ram.saturating_sub(self.free_ram)
    }

    fn used_swap(&self) -> u64 {
        self.total_swap.saturating_sub(self.free_swap)
    }

    pub fn total_virtual_bytes(&self) -> u64 {
        self.total_ram
            .saturating_add(self.total_swap)
            .saturating_mul(self.unit())
    }

    pub fn used_virtual_bytes(&self) -> u64 {
        self.used_ram()
            .saturating_add(self.used_swap())
            .saturating_mul(self.unit())
    }

    pub fn total_physical_bytes(&self) -> u64 {
        self.total_ram.saturating_mul(self.unit())
    }

    pub fn used_physical_bytes(&self) -> u64 {
        self.used_ram().saturating_mul(self.unit())
    }
}

/// Source of raw Linux memory counters
#[cfg_attr(test, mockall::automock)]
pub trait LinuxCounters: Send + Sync {
    /// Aggregate RAM and swap totals
    fn sysinfo(&self) -> Result<SysinfoTotals>;

    /// Memory lines of the calling process's status file
    fn process_status(&self) -> io::Result<ProcessStatusMemory>;
}

/// Linux memory probe
pub struct LinuxMemoryProbe<C> {
    counters: C,
}

impl<C: LinuxCounters> LinuxMemoryProbe<C> {
    pub fn new(counters: C) -> Self {
        Self { counters }
    }
}

impl<C: LinuxCounters> MemoryProbe for LinuxMemoryProbe<C> {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn snapshot(&self) -> Result<MemoryUsageSnapshot> {
        let totals = self.counters.sysinfo()?;

        let status = match self.counters.process_status() {
            Ok(status) => {
                if status.vm_size.is_none() {
                    warn!("VmSize not found in process status, defaulting to 0");
                }
                if status.vm_rss.is_none() {
                    warn!("VmRSS not found in process status, defaulting to 0");
                }
                status
            }
            Err(e) => {
                warn!("Unable to read process status, process memory reported as 0: {}", e);
                ProcessStatusMemory::default()
            }
        };

        let snapshot = MemoryUsageSnapshot {
            total_virtual_memory: totals.total_virtual_bytes(),
            total_physical_memory: totals.total_physical_bytes(),
            total_used_virtual_memory: totals.used_virtual_bytes(),
            total_used_physical_memory: totals.used_physical_bytes(),
            process_virtual_memory: status.vm_size.unwrap_or(0),
            process_physical_memory: status.vm_rss.unwrap_or(0),
        };

        debug!("Linux memory snapshot: {:?}", snapshot);
        Ok(snapshot)
    }
}

/// Live counters from `sysinfo(2)` and procfs
#[cfg(any(target_os = "linux", target_os = "android"))]
pub struct ProcfsCounters {
    status_path: PathBuf,
}

#[cfg(any(target_os = "linux", target_os = "android"))]
impl ProcfsCounters {
    pub fn new() -> Self {
        Self::with_status_path(crate::constants::PROC_SELF_STATUS)
    }

    /// Read process figures from another status file
    pub fn with_status_path(path: impl Into<PathBuf>) -> Self {
        Self {
            status_path: path.into(),
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
impl Default for ProcfsCounters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
impl LinuxCounters for ProcfsCounters {
    fn sysinfo(&self) -> Result<SysinfoTotals> {
        use crate::error::{MemUsageError, Subquery};

        // SAFETY: sysinfo is a plain C struct of integers; all-zero is a
        // valid value and the kernel fills it in place.
        let mut info: libc::sysinfo = unsafe { std::mem::zeroed() };

        // SAFETY: `info` is a valid, exclusively borrowed sysinfo struct.
        if unsafe { libc::sysinfo(&mut info) } != 0 {
            return Err(MemUsageError::last_os_error(Subquery::Sysinfo));
        }

        Ok(SysinfoTotals {
            total_ram: info.totalram as u64,
            free_ram: info.freeram as u64,
            total_swap: info.totalswap as u64,
            free_swap: info.freeswap as u64,
            mem_unit: info.mem_unit as u64,
        })
    }

    fn process_status(&self) -> io::Result<ProcessStatusMemory> {
        // The file handle is dropped, and closed, on every return path
        let file = std::fs::File::open(&self.status_path)?;
        Ok(crate::platforms::common::parse_process_status(
            io::BufReader::new(file),
        ))
    }
}
