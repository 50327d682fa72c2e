use std::fmt;
use std::io;

use thiserror::Error;

/// OS query whose failure aborts a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subquery {
    /// `sysinfo(2)` aggregate RAM and swap totals (Linux)
    Sysinfo,
    /// `statfs` on the root volume (macOS)
    RootVolumeStats,
    /// `vm.swapusage` sysctl (macOS)
    SwapUsage,
    /// `task_info` for the calling task (macOS)
    TaskInfo,
    /// `host_page_size` (macOS)
    HostPageSize,
    /// `host_statistics64` with `HOST_VM_INFO64` (macOS)
    HostStatistics,
    /// `GlobalMemoryStatusEx` (Windows)
    GlobalMemoryStatus,
    /// `GetProcessMemoryInfo` for the current process (Windows)
    ProcessMemoryCounters,
}

impl Subquery {
    /// Name of the OS call behind this sub-query
    pub fn os_call(&self) -> &'static str {
        match self {
            Subquery::Sysinfo => "sysinfo",
            Subquery::RootVolumeStats => "statfs",
            Subquery::SwapUsage => "sysctlbyname(vm.swapusage)",
            Subquery::TaskInfo => "task_info",
            Subquery::HostPageSize => "host_page_size",
            Subquery::HostStatistics => "host_statistics64",
            Subquery::GlobalMemoryStatus => "GlobalMemoryStatusEx",
            Subquery::ProcessMemoryCounters => "GetProcessMemoryInfo",
        }
    }
}

impl fmt::Display for Subquery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            Subquery::Sysinfo => "system memory totals",
            Subquery::RootVolumeStats => "root volume statistics",
            Subquery::SwapUsage => "swap usage",
            Subquery::TaskInfo => "task memory info",
            Subquery::HostPageSize => "host page size",
            Subquery::HostStatistics => "host VM statistics",
            Subquery::GlobalMemoryStatus => "global memory status",
            Subquery::ProcessMemoryCounters => "process memory counters",
        };
        write!(f, "{} ({})", what, self.os_call())
    }
}

#[derive(Error, Debug)]
pub enum MemUsageError {
    #[error("unable to get {subquery}: {reason}")]
    Subquery { subquery: Subquery, reason: String },

    #[error("memory usage is not supported on this platform")]
    UnsupportedPlatform,
}

impl MemUsageError {
    pub fn subquery(subquery: Subquery, reason: impl Into<String>) -> Self {
        MemUsageError::Subquery {
            subquery,
            reason: reason.into(),
        }
    }

    /// Failure from a call that reports through `errno`/`GetLastError`
    pub fn last_os_error(subquery: Subquery) -> Self {
        Self::subquery(subquery, io::Error::last_os_error().to_string())
    }

    /// Failure from a Mach call returning a `kern_return_t`
    pub fn kern_return(subquery: Subquery, code: i32) -> Self {
        Self::subquery(subquery, format!("kern_return_t {}", code))
    }

    /// The sub-query that failed, if this error came from one
    pub fn failed_subquery(&self) -> Option<Subquery> {
        match self {
            MemUsageError::Subquery { subquery, .. } => Some(*subquery),
            MemUsageError::UnsupportedPlatform => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MemUsageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_names_failing_subquery() {
        let err = MemUsageError::kern_return(Subquery::HostStatistics, 5);
        assert_eq!(err.failed_subquery(), Some(Subquery::HostStatistics));

        let message = err.to_string();
        assert!(message.contains("host VM statistics"));
        assert!(message.contains("host_statistics64"));
        assert!(message.contains("5"));
    }

    #[test]
    fn test_unsupported_platform_has_no_subquery() {
        assert_eq!(MemUsageError::UnsupportedPlatform.failed_subquery(), None);
    }
}
