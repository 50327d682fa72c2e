use std::fmt::Write;

use serde_json::json;

use crate::models::{bytes_to_mb, MemoryUsageSnapshot};

/// Create a JSON summary of a snapshot.
///
/// The six fields are emitted under `memory_usage` with their byte values,
/// alongside the OS the snapshot was taken on.
///
/// # Example Output
///
/// ```json
/// {
///   "os": "linux",
///   "tool_version": "0.1.0",
///   "memory_usage": {
///     "total_virtual_memory": 10737418240,
///     ...
///   }
/// }
/// ```
pub fn create_usage_summary(
    snapshot: &MemoryUsageSnapshot,
    pretty: bool,
) -> serde_json::Result<String> {
    let summary = json!({
        "os": std::env::consts::OS,
        "tool_version": env!("CARGO_PKG_VERSION"),
        "memory_usage": snapshot,
    });

    if pretty {
        serde_json::to_string_pretty(&summary)
    } else {
        serde_json::to_string(&summary)
    }
}

/// Render a snapshot as an aligned text report, one field per line
pub fn render_text_report(snapshot: &MemoryUsageSnapshot, raw_bytes: bool) -> String {
    let mut report = String::new();

    for (label, value) in snapshot.fields() {
        let value = if raw_bytes {
            format!("{} bytes", value)
        } else {
            format!("{:.2} MB", bytes_to_mb(value))
        };
        // Writing to a String cannot fail
        let _ = writeln!(report, "{:<28}{:>20}", label, value);
    }

    if cfg!(target_os = "macos") {
        report.push_str(
            "\nnote: total_physical_memory is free RAM and total_virtual_memory is \
             free space on the root volume on macOS\n",
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryUsageSnapshot {
        MemoryUsageSnapshot {
            total_virtual_memory: 10 * 1024 * 1024 * 1024,
            total_physical_memory: 8 * 1024 * 1024 * 1024,
            total_used_virtual_memory: 2 * 1024 * 1024 * 1024,
            total_used_physical_memory: 2 * 1024 * 1024 * 1024,
            process_virtual_memory: 10240 * 1024,
            process_physical_memory: 2048 * 1024,
        }
    }

    #[test]
    fn test_json_summary_round_trips_snapshot() {
        let json = create_usage_summary(&sample(), false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["os"], std::env::consts::OS);
        let usage: MemoryUsageSnapshot =
            serde_json::from_value(value["memory_usage"].clone()).unwrap();
        assert_eq!(usage, sample());
    }

    #[test]
    fn test_pretty_summary_is_multiline() {
        let json = create_usage_summary(&sample(), true).unwrap();
        assert!(json.lines().count() > 1);
    }

    #[test]
    fn test_text_report_in_megabytes() {
        let report = render_text_report(&sample(), false);
        assert!(report.contains("total_physical_memory"));
        assert!(report.contains("8192.00 MB"));
        assert!(report.contains("10.00 MB"));
    }

    #[test]
    fn test_text_report_in_bytes() {
        let report = render_text_report(&sample(), true);
        assert!(report.contains("2097152 bytes"));
        assert_eq!(
            report.lines().filter(|l| l.ends_with("bytes")).count(),
            6
        );
    }
}
