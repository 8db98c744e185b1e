// CLI module
// Command-line interface and argument parsing

mod args;

pub use args::{CliArgs, LogFormatArg};

use clap::Parser;

/// Parse command-line arguments using clap
///
/// Every flag can also be supplied through its environment variable. If
/// parsing fails (or `--help` is given), clap prints the message and exits
/// the process.
///
/// # Returns
///
/// Returns a `CliArgs` struct with the parsed arguments.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
