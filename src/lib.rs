//! # mem-usage
//!
//! A single cross-platform query for current memory usage, returning six
//! byte counts describing the host and the calling process.
//!
//! ## Usage
//!
//! ```no_run
//! # fn main() -> mem_usage::Result<()> {
//! let usage = mem_usage::get_memory_usage()?;
//!
//! println!("RAM in use: {} bytes", usage.total_used_physical_memory);
//! println!("This process: {} bytes resident", usage.process_physical_memory);
//! # Ok(())
//! # }
//! ```
//!
//! ## Platforms
//!
//! - **Linux/Android**: `sysinfo(2)` for system totals, `/proc/self/status`
//!   (`VmSize`, `VmRSS`) for the process. Missing status lines read as zero.
//! - **macOS**: root volume `statfs`, the `vm.swapusage` sysctl, Mach
//!   `task_info`, `host_page_size` and `host_statistics64`. The "total"
//!   physical and virtual fields are derived from free counters; see
//!   [`MemoryUsageSnapshot`].
//! - **Windows**: `GlobalMemoryStatusEx` and `GetProcessMemoryInfo`.
//!
//! On macOS and Windows any failing OS call aborts the whole query with a
//! [`MemUsageError::Subquery`] naming that call.
//!
//! ## Module Organization
//!
//! - [`models`]: the snapshot record
//! - [`platforms`]: per-OS backends and the [`MemoryProbe`] trait
//! - [`error`]: error types
//! - [`utils`]: text rendering for the command-line tool
//! - [`constants`]: OS paths, labels and unit factors
//!
//! ## Safety
//!
//! FFI calls are confined to the OS-gated counter sources in
//! [`platforms`], each documented with its safety invariant.

/// Snapshot data model
pub mod models;

/// Error types
pub mod error;

/// Platform-specific memory usage backends
pub mod platforms;

/// Rendering helpers
pub mod utils;

/// Application constants
pub mod constants;

pub use error::{MemUsageError, Result, Subquery};
pub use models::MemoryUsageSnapshot;
pub use platforms::{get_memory_probe, get_memory_usage, MemoryProbe};
