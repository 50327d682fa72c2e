use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

mod cli;

use cli::Args;
use mem_usage::get_memory_usage;
use mem_usage::utils::summary::{create_usage_summary, render_text_report};

fn main() -> Result<()> {
    // Parse arguments
    let args = Args::parse();

    // Initialize logging
    initialize_logging(args.verbose)?;

    let usage = get_memory_usage().context("Failed to read memory usage")?;
    debug!("Snapshot: {:?}", usage);

    if args.wants_json() {
        let json = create_usage_summary(&usage, args.pretty)
            .context("Failed to serialize memory usage")?;
        println!("{}", json);
    } else {
        print!("{}", render_text_report(&usage, args.bytes));
    }

    Ok(())
}

/// Initialize logging with the specified verbosity level
fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ).context("Failed to initialize logger")?;
    Ok(())
}
