//! Integration tests for the live memory usage query.
//!
//! These run against the real OS counters of the host, so they only check
//! relationships that hold on any machine.

#![cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "windows"
))]

use anyhow::Result;
use rayon::prelude::*;

use mem_usage::{get_memory_probe, get_memory_usage, MemoryUsageSnapshot};

fn assert_self_consistent(usage: &MemoryUsageSnapshot) {
    assert!(usage.process_physical_memory > 0, "{:?}", usage);
    assert!(usage.process_virtual_memory > 0, "{:?}", usage);

    // macOS "total" physical is free RAM, so no ordering holds there
    #[cfg(not(target_os = "macos"))]
    {
        assert!(usage.total_physical_memory > 0, "{:?}", usage);
        assert!(
            usage.total_used_physical_memory <= usage.total_physical_memory,
            "{:?}",
            usage
        );
        assert!(
            usage.total_used_virtual_memory <= usage.total_virtual_memory,
            "{:?}",
            usage
        );
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        assert!(usage.total_virtual_memory >= usage.total_physical_memory);
        assert!(usage.process_physical_memory <= usage.process_virtual_memory);
    }
}

#[test]
fn test_live_snapshot() -> Result<()> {
    let usage = get_memory_usage()?;
    assert_self_consistent(&usage);
    Ok(())
}

#[test]
fn test_probe_names_current_platform() -> Result<()> {
    let probe = get_memory_probe()?;
    let expected = match std::env::consts::OS {
        "android" => "linux",
        os => os,
    };
    assert_eq!(probe.name(), expected);
    Ok(())
}

#[test]
fn test_each_call_rereads_process_memory() -> Result<()> {
    const BALLAST: usize = 64 * 1024 * 1024;

    // A non-zero fill touches every page, so all of it is resident
    let ballast = vec![1u8; BALLAST];
    let usage = get_memory_usage()?;
    assert!(ballast.iter().step_by(4096).all(|&b| b == 1));

    assert!(usage.process_physical_memory >= BALLAST as u64, "{:?}", usage);
    assert!(usage.process_virtual_memory >= BALLAST as u64, "{:?}", usage);
    Ok(())
}

#[test]
fn test_concurrent_calls() {
    let results: Vec<_> = (0..100)
        .into_par_iter()
        .map(|_| get_memory_usage())
        .collect();

    assert_eq!(results.len(), 100);
    for result in results {
        let usage = result.expect("concurrent snapshot failed");
        assert_self_consistent(&usage);
    }
}
