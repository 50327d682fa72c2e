//! Windows memory usage backend
//!
//! Reads `GlobalMemoryStatusEx` for page-file and RAM totals and
//! `GetProcessMemoryInfo` for the current process. Both return codes are
//! checked and a failing call aborts the snapshot.

use log::debug;

use crate::error::Result;
use crate::models::MemoryUsageSnapshot;
use crate::platforms::MemoryProbe;

/// Fields of `MEMORYSTATUSEX` the snapshot needs, in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalMemoryStatus {
    pub total_page_file: u64,
    pub avail_page_file: u64,
    pub total_phys: u64,
    pub avail_phys: u64,
}

/// Fields of `PROCESS_MEMORY_COUNTERS_EX` the snapshot needs, in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessMemoryCounters {
    pub private_usage: u64,
    pub working_set_size: u64,
}

/// Source of raw Windows memory counters
#[cfg_attr(test, mockall::automock)]
pub trait WindowsCounters: Send + Sync {
    fn global_memory_status(&self) -> Result<GlobalMemoryStatus>;

    fn process_memory_counters(&self) -> Result<ProcessMemoryCounters>;
}

/// Windows memory probe
pub struct WindowsMemoryProbe<C> {
    counters: C,
}

impl<C: WindowsCounters> WindowsMemoryProbe<C> {
    pub fn new(counters: C) -> Self {
        Self { counters }
    }
}

impl<C: WindowsCounters> MemoryProbe for WindowsMemoryProbe<C> {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn snapshot(&self) -> Result<MemoryUsageSnapshot> {
        let status = self.counters.global_memory_status()?;
        let process = self.counters.process_memory_counters()?;

        let snapshot = MemoryUsageSnapshot {
            total_virtual_memory: status.total_page_file,
            total_physical_memory: status.total_phys,
            total_used_virtual_memory: status
                .total_page_file
                .saturating_sub(status.avail_page_file),
            total_used_physical_memory: status.total_phys.saturating_sub(status.avail_phys),
            process_virtual_memory: process.private_usage,
            process_physical_memory: process.working_set_size,
        };

        debug!("Windows memory snapshot: {:?}", snapshot);
        Ok(snapshot)
    }
}

#[cfg(target_os = "windows")]
pub use self::win32::Win32Counters;

#[cfg(target_os = "windows")]
mod win32 {
    use std::mem;

    use winapi::shared::minwindef::DWORD;
    use winapi::um::processthreadsapi::GetCurrentProcess;
    use winapi::um::psapi::{
        GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS, PROCESS_MEMORY_COUNTERS_EX,
    };
    use winapi::um::sysinfoapi::{GlobalMemoryStatusEx, MEMORYSTATUSEX};

    use super::{GlobalMemoryStatus, ProcessMemoryCounters, WindowsCounters};
    use crate::error::{MemUsageError, Result, Subquery};

    /// Live counters from the Win32 API
    #[derive(Debug, Default)]
    pub struct Win32Counters;

    impl Win32Counters {
        pub fn new() -> Self {
            Win32Counters
        }
    }

    impl WindowsCounters for Win32Counters {
        fn global_memory_status(&self) -> Result<GlobalMemoryStatus> {
            // SAFETY: MEMORYSTATUSEX is a plain C struct; all-zero is valid.
            let mut mem_info: MEMORYSTATUSEX = unsafe { mem::zeroed() };
            mem_info.dwLength = mem::size_of::<MEMORYSTATUSEX>() as DWORD;

            // SAFETY: mem_info is writable and dwLength is set as required.
            if unsafe { GlobalMemoryStatusEx(&mut mem_info) } == 0 {
                return Err(MemUsageError::last_os_error(Subquery::GlobalMemoryStatus));
            }

            Ok(GlobalMemoryStatus {
                total_page_file: mem_info.ullTotalPageFile,
                avail_page_file: mem_info.ullAvailPageFile,
                total_phys: mem_info.ullTotalPhys,
                avail_phys: mem_info.ullAvailPhys,
            })
        }

        fn process_memory_counters(&self) -> Result<ProcessMemoryCounters> {
            // SAFETY: PROCESS_MEMORY_COUNTERS_EX is a plain C struct; all-zero is valid.
            let mut pmc: PROCESS_MEMORY_COUNTERS_EX = unsafe { mem::zeroed() };
            let size = mem::size_of::<PROCESS_MEMORY_COUNTERS_EX>() as DWORD;

            // SAFETY: GetCurrentProcess returns a pseudo-handle that needs no
            // closing. pmc is writable for `size` bytes; the EX struct starts
            // with the PROCESS_MEMORY_COUNTERS layout.
            let ok = unsafe {
                GetProcessMemoryInfo(
                    GetCurrentProcess(),
                    &mut pmc as *mut PROCESS_MEMORY_COUNTERS_EX as *mut PROCESS_MEMORY_COUNTERS,
                    size,
                )
            };
            if ok == 0 {
                return Err(MemUsageError::last_os_error(Subquery::ProcessMemoryCounters));
            }

            Ok(ProcessMemoryCounters {
                private_usage: pmc.PrivateUsage as u64,
                working_set_size: pmc.WorkingSetSize as u64,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MemUsageError, Subquery};

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_snapshot_from_counters() {
        let mut counters = MockWindowsCounters::new();
        counters.expect_global_memory_status().returning(|| {
            Ok(GlobalMemoryStatus {
                total_page_file: 24 * GIB,
                avail_page_file: 14 * GIB,
                total_phys: 16 * GIB,
                avail_phys: 9 * GIB,
            })
        });
        counters.expect_process_memory_counters().returning(|| {
            Ok(ProcessMemoryCounters {
                private_usage: 80 * 1024 * 1024,
                working_set_size: 60 * 1024 * 1024,
            })
        });

        let snapshot = WindowsMemoryProbe::new(counters).snapshot().unwrap();
        assert_eq!(snapshot.total_virtual_memory, 24 * GIB);
        assert_eq!(snapshot.total_used_virtual_memory, 10 * GIB);
        assert_eq!(snapshot.total_physical_memory, 16 * GIB);
        assert_eq!(snapshot.total_used_physical_memory, 7 * GIB);
        assert_eq!(snapshot.process_virtual_memory, 80 * 1024 * 1024);
        assert_eq!(snapshot.process_physical_memory, 60 * 1024 * 1024);
        assert!(snapshot.total_used_physical_memory <= snapshot.total_physical_memory);
    }

    #[test]
    fn test_global_status_failure_aborts_snapshot() {
        let mut counters = MockWindowsCounters::new();
        counters
            .expect_global_memory_status()
            .returning(|| Err(MemUsageError::subquery(Subquery::GlobalMemoryStatus, "denied")));
        counters.expect_process_memory_counters().times(0);

        let err = WindowsMemoryProbe::new(counters).snapshot().unwrap_err();
        assert_eq!(err.failed_subquery(), Some(Subquery::GlobalMemoryStatus));
    }

    #[test]
    fn test_process_counters_failure_aborts_snapshot() {
        let mut counters = MockWindowsCounters::new();
        counters
            .expect_global_memory_status()
            .returning(|| Ok(GlobalMemoryStatus::default()));
        counters.expect_process_memory_counters().returning(|| {
            Err(MemUsageError::subquery(Subquery::ProcessMemoryCounters, "denied"))
        });

        let err = WindowsMemoryProbe::new(counters).snapshot().unwrap_err();
        assert_eq!(err.failed_subquery(), Some(Subquery::ProcessMemoryCounters));
        assert!(err.to_string().contains("GetProcessMemoryInfo"));
    }

    #[test]
    fn test_available_above_total_does_not_wrap() {
        let mut counters = MockWindowsCounters::new();
        counters.expect_global_memory_status().returning(|| {
            Ok(GlobalMemoryStatus {
                total_page_file: 1,
                avail_page_file: 2,
                total_phys: 1,
                avail_phys: 2,
            })
        });
        counters
            .expect_process_memory_counters()
            .returning(|| Ok(ProcessMemoryCounters::default()));

        let snapshot = WindowsMemoryProbe::new(counters).snapshot().unwrap();
        assert_eq!(snapshot.total_used_virtual_memory, 0);
        assert_eq!(snapshot.total_used_physical_memory, 0);
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn test_live_win32_counters() {
        let counters = Win32Counters::new();
        let status = counters.global_memory_status().unwrap();
        assert!(status.total_phys > 0);
        assert!(status.avail_phys <= status.total_phys);

        let process = counters.process_memory_counters().unwrap();
        assert!(process.working_set_size > 0);
    }
}
