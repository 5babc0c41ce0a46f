use std::path::PathBuf;

use clap::Parser;

/// The command line interface for hwbench.
///
/// Bench commands are read from standard input, one per line, up to the
/// first `exit`.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the bench configuration file
    #[arg(required_unless_present = "config_example")]
    pub config: Option<PathBuf>,

    /// Directory the port logs are written to on exit
    #[arg(required_unless_present = "config_example")]
    pub log_dir: Option<PathBuf>,

    /// Log level for diagnostics on stderr; `RUST_LOG` takes precedence
    #[arg(long)]
    pub log_level: Option<String>,

    /// Show an example of a configuration file's contents
    #[arg(long)]
    pub config_example: bool,
}
