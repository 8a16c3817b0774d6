//! CLI argument definitions using clap
//!
//! Commands:
//! - fixity check --config <path> [--object <id>... | --handle <h> | --loop] [limits] [--verbose] [--prune]
//! - fixity prune --config <path>
//! - fixity seed --config <path>
//! - fixity remove --config <path> --object <id>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// fixity - continuous digest auditing for stored objects
#[derive(Parser, Debug)]
#[command(name = "fixity")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Seed, then check objects and report problems
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./fixity.json")]
        config: PathBuf,

        #[command(flatten)]
        options: CheckOptions,
    },

    /// Delete history rows past their retention age
    Prune {
        /// Path to configuration file
        #[arg(long, default_value = "./fixity.json")]
        config: PathBuf,
    },

    /// Create ledger rows for catalog objects that have none
    Seed {
        /// Path to configuration file
        #[arg(long, default_value = "./fixity.json")]
        config: PathBuf,
    },

    /// Forget an object that was removed from storage
    Remove {
        /// Path to configuration file
        #[arg(long, default_value = "./fixity.json")]
        config: PathBuf,

        /// Object id
        #[arg(long)]
        object: String,
    },
}

/// Scope, limits and reporting for `check`.
///
/// Without `--object` or `--handle` every pending object is checked at most
/// once; `--loop` keeps cycling instead.
#[derive(Args, Debug, Clone, Default)]
pub struct CheckOptions {
    /// Check these objects, in the order given
    #[arg(long, num_args = 1.., conflicts_with_all = ["handle", "continuous"])]
    pub object: Vec<String>,

    /// Check every object beneath a catalog handle
    #[arg(long, conflicts_with = "continuous")]
    pub handle: Option<String>,

    /// Cycle through pending objects until a limit stops the run
    #[arg(long = "loop")]
    pub continuous: bool,

    /// Stop after this many objects
    #[arg(long)]
    pub count: Option<u64>,

    /// Stop once this much time has passed, e.g. 30m, 2h, 1d
    #[arg(long)]
    pub duration: Option<String>,

    /// Report matches as well as problems
    #[arg(long)]
    pub verbose: bool,

    /// Prune history before checking
    #[arg(long)]
    pub prune: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
