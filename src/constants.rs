//! Global constants for the mem-usage crate.
//!
//! This module centralizes the OS paths, labels and unit factors the
//! platform backends read from.

// Unit constants
/// Bytes per kibibyte, the unit `/proc/self/status` reports sizes in
pub const KIB: u64 = 1024;

/// Bytes per megabyte, used by the text report (1MB = 1024 * 1024)
pub const BYTES_PER_MB: u64 = 1024 * 1024;

// Linux constants
/// Status pseudo-file of the calling process
pub const PROC_SELF_STATUS: &str = "/proc/self/status";

/// Label of the process virtual memory line in the status file
pub const VM_SIZE_LABEL: &str = "VmSize:";

/// Label of the process resident memory line in the status file
pub const VM_RSS_LABEL: &str = "VmRSS:";

// macOS constants
/// Volume whose free blocks stand in for free swap capacity
pub const ROOT_VOLUME: &str = "/";

/// sysctl name reporting swap usage as an `xsw_usage` record
pub const SWAP_USAGE_SYSCTL: &str = "vm.swapusage";
