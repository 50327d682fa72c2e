//! Platform-specific memory usage implementations
//!
//! Each backend pairs a raw-counter source trait with a probe that turns
//! those counters into a [`MemoryUsageSnapshot`]. The probes and their
//! arithmetic compile on every target; only the OS-backed sources are
//! gated, so exactly one live backend is compiled into a given build.

use crate::error::Result;
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "windows"
)))]
use crate::error::MemUsageError;
use crate::models::MemoryUsageSnapshot;

pub mod common;
pub mod linux;
pub mod macos;
pub mod windows;

/// Memory usage capability implemented once per platform
pub trait MemoryProbe: Send + Sync {
    /// Short backend name, for logging
    fn name(&self) -> &'static str;

    /// Read live OS counters into a fresh snapshot
    fn snapshot(&self) -> Result<MemoryUsageSnapshot>;
}

/// Get the memory probe for the current platform
pub fn get_memory_probe() -> Result<Box<dyn MemoryProbe>> {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        Ok(Box::new(linux::LinuxMemoryProbe::new(linux::ProcfsCounters::new())))
    }

    #[cfg(target_os = "macos")]
    {
        Ok(Box::new(macos::MacOSMemoryProbe::new(macos::MachCounters::new())))
    }

    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(windows::WindowsMemoryProbe::new(windows::Win32Counters::new())))
    }

    #[cfg(not(any(
        target_os = "linux",
        target_os = "android",
        target_os = "macos",
        target_os = "windows"
    )))]
    {
        Err(MemUsageError::UnsupportedPlatform)
    }
}

/// Take a snapshot of current memory usage.
///
/// Every call re-reads OS state and releases any file, handle or port it
/// opened before returning. Safe to call concurrently from many threads.
pub fn get_memory_usage() -> Result<MemoryUsageSnapshot> {
    let probe = get_memory_probe()?;
    log::debug!("Reading memory usage with {} probe", probe.name());
    probe.snapshot()
}
