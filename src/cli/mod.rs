//! CLI module for fixity
//!
//! Provides command-line interface for:
//! - check: Seed, then check objects and report problems
//! - prune: Apply history retention
//! - seed: Create missing ledger rows
//! - remove: Process an object-removal notification

mod args;
mod commands;
mod errors;
mod io;

pub use args::{CheckOptions, Cli, Command};
pub use commands::{check, prune, remove, run_command, seed};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};

/// Parse arguments and run the selected command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}
