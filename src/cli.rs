use clap::Parser;

/// Command-line arguments for the mem-usage tool.
///
/// The tool takes a single snapshot and prints it; there is no sampling
/// loop and no configuration file.
#[derive(Parser, Debug)]
#[clap(name = "mem-usage", about = "Print current system and process memory usage")]
pub struct Args {
    /// Emit the snapshot as JSON
    #[clap(long)]
    pub json: bool,

    /// Pretty-print JSON output (implies --json)
    #[clap(long)]
    pub pretty: bool,

    /// Show raw byte counts instead of megabytes in the text report
    #[clap(long)]
    pub bytes: bool,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn wants_json(&self) -> bool {
        self.json || self.pretty
    }
}
