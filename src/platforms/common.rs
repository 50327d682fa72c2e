//! Platform-independent helpers shared by the backends
//!
//! The `/proc/<pid>/status` tokenizer lives here rather than in the Linux
//! backend so that it can be exercised on every host.

use std::io::BufRead;

use log::warn;

use crate::constants::{KIB, VM_RSS_LABEL, VM_SIZE_LABEL};

/// Process memory figures scanned from a status file, in bytes.
///
/// `None` means the label never appeared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStatusMemory {
    pub vm_size: Option<u64>,
    pub vm_rss: Option<u64>,
}

impl ProcessStatusMemory {
    fn is_complete(&self) -> bool {
        self.vm_size.is_some() && self.vm_rss.is_some()
    }
}

/// Scan a status file for the `VmSize:` and `VmRSS:` lines.
///
/// Values are reported in kibibytes and returned in bytes. A label with a
/// missing or malformed value counts as zero. Lines are split on raw bytes
/// so a non-UTF-8 process name cannot abort the scan, and reading stops as
/// soon as both labels are seen. A read error ends the scan and keeps
/// whatever was found before it.
pub fn parse_process_status<R: BufRead>(reader: R) -> ProcessStatusMemory {
    let mut memory = ProcessStatusMemory::default();

    for line in reader.split(b'\n') {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Status file read failed, keeping labels found so far: {}", e);
                break;
            }
        };
        let line = String::from_utf8_lossy(&line);
        let mut tokens = line.split_whitespace();

        let slot = match tokens.next() {
            Some(VM_SIZE_LABEL) => &mut memory.vm_size,
            Some(VM_RSS_LABEL) => &mut memory.vm_rss,
            _ => continue,
        };

        let kib = match tokens.next().map(str::parse::<u64>) {
            Some(Ok(value)) => value,
            other => {
                warn!("Unparseable value in status line {:?}, defaulting to 0: {:?}", line, other);
                0
            }
        };
        *slot = Some(kib.saturating_mul(KIB));

        if memory.is_complete() {
            break;
        }
    }

    memory
}
