//! macOS memory usage backend
//!
//! Five independent queries feed the snapshot: `statfs` on the root volume,
//! the `vm.swapusage` sysctl, Mach `task_info` for the calling task, the
//! host page size and host VM statistics. Any one failing aborts the whole
//! snapshot with an error naming that query; no field is ever zero-filled
//! in place of a failed call.
//!
//! `total_virtual_memory` and `total_physical_memory` are computed from
//! *free* counters (root volume free space and free pages). See
//! [`MemoryUsageSnapshot`] for what that means to callers.

use log::debug;

use crate::error::Result;
use crate::models::MemoryUsageSnapshot;
use crate::platforms::MemoryProbe;

/// Resident and virtual size of the calling task, in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskMemory {
    pub resident_size: u64,
    pub virtual_size: u64,
}

/// Page counts from `HOST_VM_INFO64`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostVmPages {
    pub free: u64,
    pub active: u64,
    pub inactive: u64,
    pub wired: u64,
}

impl HostVmPages {
    fn in_use(&self) -> u64 {
        self.active
            .saturating_add(self.inactive)
            .saturating_add(self.wired)
    }
}

/// Source of raw Darwin memory counters
#[cfg_attr(test, mockall::automock)]
pub trait DarwinCounters: Send + Sync {
    /// Free blocks × block size of the root volume
    fn root_volume_free_bytes(&self) -> Result<u64>;

    /// Bytes currently swapped out
    fn swap_used_bytes(&self) -> Result<u64>;

    fn task_memory(&self) -> Result<TaskMemory>;

    fn host_page_size(&self) -> Result<u64>;

    fn host_vm_pages(&self) -> Result<HostVmPages>;
}

/// macOS memory probe
pub struct MacOSMemoryProbe<C> {
    counters: C,
}

impl<C: DarwinCounters> MacOSMemoryProbe<C> {
    pub fn new(counters: C) -> Self {
        Self { counters }
    }
}

impl<C: DarwinCounters> MemoryProbe for MacOSMemoryProbe<C> {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn snapshot(&self) -> Result<MemoryUsageSnapshot> {
        let total_virtual_memory = self.counters.root_volume_free_bytes()?;
        let total_used_virtual_memory = self.counters.swap_used_bytes()?;
        let task = self.counters.task_memory()?;
        let page_size = self.counters.host_page_size()?;
        let pages = self.counters.host_vm_pages()?;

        let snapshot = MemoryUsageSnapshot {
            total_virtual_memory,
            total_physical_memory: pages.free.saturating_mul(page_size),
            total_used_virtual_memory,
            total_used_physical_memory: pages.in_use().saturating_mul(page_size),
            process_virtual_memory: task.virtual_size,
            process_physical_memory: task.resident_size,
        };

        debug!("macOS memory snapshot: {:?}", snapshot);
        Ok(snapshot)
    }
}

#[cfg(target_os = "macos")]
pub use self::mach_counters::MachCounters;

#[cfg(target_os = "macos")]
mod mach_counters {
    use std::ffi::CString;
    use std::mem;
    use std::ptr;

    use mach::kern_return::{kern_return_t, KERN_SUCCESS};
    use mach::mach_port::mach_port_deallocate;
    use mach::port::mach_port_t;
    use mach::traps::mach_task_self;
    use mach::vm_types::vm_size_t;

    use super::{DarwinCounters, HostVmPages, TaskMemory};
    use crate::constants::{ROOT_VOLUME, SWAP_USAGE_SYSCTL};
    use crate::error::{MemUsageError, Result, Subquery};

    extern "C" {
        fn mach_host_self() -> mach_port_t;
        fn host_page_size(host: mach_port_t, out_page_size: *mut vm_size_t) -> kern_return_t;
    }

    /// Send right to the host port, released on drop
    struct HostPort(mach_port_t);

    impl HostPort {
        fn acquire() -> Self {
            // SAFETY: mach_host_self takes no arguments and returns a send
            // right owned by this task, released in Drop.
            HostPort(unsafe { mach_host_self() })
        }
    }

    impl Drop for HostPort {
        fn drop(&mut self) {
            // SAFETY: self.0 is a send right obtained from mach_host_self and
            // is deallocated exactly once.
            unsafe {
                mach_port_deallocate(mach_task_self(), self.0);
            }
        }
    }

    fn c_string(value: &str, subquery: Subquery) -> Result<CString> {
        CString::new(value).map_err(|e| MemUsageError::subquery(subquery, e.to_string()))
    }

    /// Live counters from libc and the Mach kernel interfaces
    #[derive(Debug, Default)]
    pub struct MachCounters;

    impl MachCounters {
        pub fn new() -> Self {
            MachCounters
        }
    }

    impl DarwinCounters for MachCounters {
        fn root_volume_free_bytes(&self) -> Result<u64> {
            let path = c_string(ROOT_VOLUME, Subquery::RootVolumeStats)?;

            // SAFETY: statfs is a plain C struct; all-zero is a valid value.
            let mut stats: libc::statfs = unsafe { mem::zeroed() };

            // SAFETY: path is NUL-terminated and stats is exclusively borrowed.
            if unsafe { libc::statfs(path.as_ptr(), &mut stats) } != 0 {
                return Err(MemUsageError::last_os_error(Subquery::RootVolumeStats));
            }

            Ok((stats.f_bsize as u64).saturating_mul(stats.f_bfree as u64))
        }

        fn swap_used_bytes(&self) -> Result<u64> {
            let name = c_string(SWAP_USAGE_SYSCTL, Subquery::SwapUsage)?;

            // SAFETY: xsw_usage is a plain C struct; all-zero is a valid value.
            let mut usage: libc::xsw_usage = unsafe { mem::zeroed() };
            let mut size = mem::size_of::<libc::xsw_usage>();

            // SAFETY: name is NUL-terminated, the output buffer and its
            // length describe `usage`, and no new value is written.
            let rc = unsafe {
                libc::sysctlbyname(
                    name.as_ptr(),
                    &mut usage as *mut libc::xsw_usage as *mut libc::c_void,
                    &mut size,
                    ptr::null_mut(),
                    0,
                )
            };
            if rc != 0 {
                return Err(MemUsageError::last_os_error(Subquery::SwapUsage));
            }

            Ok(usage.xsu_used)
        }

        fn task_memory(&self) -> Result<TaskMemory> {
            // SAFETY: mach_task_basic_info is a plain C struct; all-zero is valid.
            let mut info: libc::mach_task_basic_info = unsafe { mem::zeroed() };
            let mut count = libc::MACH_TASK_BASIC_INFO_COUNT;

            // SAFETY: info and count describe a MACH_TASK_BASIC_INFO buffer.
            // mach_task_self returns a cached right that must not be released.
            let kr = unsafe {
                libc::task_info(
                    mach_task_self(),
                    libc::MACH_TASK_BASIC_INFO,
                    &mut info as *mut libc::mach_task_basic_info as libc::task_info_t,
                    &mut count,
                )
            };
            if kr != KERN_SUCCESS {
                return Err(MemUsageError::kern_return(Subquery::TaskInfo, kr));
            }

            Ok(TaskMemory {
                resident_size: info.resident_size as u64,
                virtual_size: info.virtual_size as u64,
            })
        }

        fn host_page_size(&self) -> Result<u64> {
            let host = HostPort::acquire();
            let mut page_size: vm_size_t = 0;

            // SAFETY: host.0 is a live host port and page_size is writable.
            let kr = unsafe { host_page_size(host.0, &mut page_size) };
            if kr != KERN_SUCCESS {
                return Err(MemUsageError::kern_return(Subquery::HostPageSize, kr));
            }

            Ok(page_size as u64)
        }

        fn host_vm_pages(&self) -> Result<HostVmPages> {
            let host = HostPort::acquire();

            // SAFETY: vm_statistics64 is a plain C struct; all-zero is valid.
            let mut stats: libc::vm_statistics64 = unsafe { mem::zeroed() };
            let mut count = libc::HOST_VM_INFO64_COUNT;

            // SAFETY: stats and count describe a HOST_VM_INFO64 buffer.
            let kr = unsafe {
                libc::host_statistics64(
                    host.0,
                    libc::HOST_VM_INFO64,
                    &mut stats as *mut libc::vm_statistics64 as libc::host_info64_t,
                    &mut count,
                )
            };
            if kr != KERN_SUCCESS {
                return Err(MemUsageError::kern_return(Subquery::HostStatistics, kr));
            }

            Ok(HostVmPages {
                free: stats.free_count as u64,
                active: stats.active_count as u64,
                inactive: stats.inactive_count as u64,
                wired: stats.wire_count as u64,
            })
        }
    }
}
