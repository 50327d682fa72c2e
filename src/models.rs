use serde::{Deserialize, Serialize};

use crate::constants::BYTES_PER_MB;

/// Memory usage of the host and of the calling process at one instant.
///
/// Every field is a byte count. Each call to
/// [`get_memory_usage`](crate::get_memory_usage) re-reads live OS state and
/// returns a fresh value; nothing is cached between calls.
///
/// # macOS field semantics
///
/// On macOS two of the "total" fields are derived from *free* counters:
///
/// - `total_virtual_memory` is the free space of the root volume
///   (free blocks × block size), the backing store swap files grow into.
/// - `total_physical_memory` is the free page count × page size.
///
/// These do not mean the same thing as on Linux and Windows, and
/// `total_used_physical_memory` may exceed `total_physical_memory` there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryUsageSnapshot {
    /// RAM plus swap/page-file capacity
    pub total_virtual_memory: u64,
    /// Installed RAM (free RAM on macOS)
    pub total_physical_memory: u64,
    /// System-wide committed virtual memory
    pub total_used_virtual_memory: u64,
    /// System-wide RAM in use
    pub total_used_physical_memory: u64,
    /// Virtual memory committed to the calling process
    pub process_virtual_memory: u64,
    /// Resident set / working set of the calling process
    pub process_physical_memory: u64,
}

impl MemoryUsageSnapshot {
    /// Field labels and values in declaration order
    pub fn fields(&self) -> [(&'static str, u64); 6] {
        [
            ("total_virtual_memory", self.total_virtual_memory),
            ("total_physical_memory", self.total_physical_memory),
            ("total_used_virtual_memory", self.total_used_virtual_memory),
            ("total_used_physical_memory", self.total_used_physical_memory),
            ("process_virtual_memory", self.process_virtual_memory),
            ("process_physical_memory", self.process_physical_memory),
        ]
    }
}

/// Convert a byte count to megabytes for display
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_uses_field_names() {
        let snapshot = MemoryUsageSnapshot {
            total_virtual_memory: 1,
            total_physical_memory: 2,
            total_used_virtual_memory: 3,
            total_used_physical_memory: 4,
            process_virtual_memory: 5,
            process_physical_memory: 6,
        };

        let json: serde_json::Value = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["total_virtual_memory"], 1);
        assert_eq!(json["total_used_physical_memory"], 4);
        assert_eq!(json["process_physical_memory"], 6);
    }

    #[test]
    fn test_fields_follow_declaration_order() {
        let snapshot = MemoryUsageSnapshot {
            process_virtual_memory: 42,
            ..Default::default()
        };

        let fields = snapshot.fields();
        assert_eq!(fields[0].0, "total_virtual_memory");
        assert_eq!(fields[4], ("process_virtual_memory", 42));
    }

    #[test]
    fn test_bytes_to_mb() {
        assert_eq!(bytes_to_mb(0), 0.0);
        assert_eq!(bytes_to_mb(3 * 1024 * 1024), 3.0);
        assert_eq!(bytes_to_mb(512 * 1024), 0.5);
    }
}
