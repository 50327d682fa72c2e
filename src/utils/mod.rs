//! Utility functions for presenting memory usage snapshots.
//!
//! ## Common Use Cases
//!
//! ### Printing a Report
//!
//! ```no_run
//! use mem_usage::utils::summary::render_text_report;
//!
//! # fn example() -> mem_usage::Result<()> {
//! let usage = mem_usage::get_memory_usage()?;
//! print!("{}", render_text_report(&usage, false));
//! # Ok(())
//! # }
//! ```

/// Text and JSON rendering of snapshots
pub mod summary;
