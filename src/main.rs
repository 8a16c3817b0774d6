//! fixity CLI entry point
//!
//! Parses arguments, runs the command, and on failure writes the error
//! response and exits non-zero. All logic lives in the `cli` module.

use fixity::cli;

fn main() {
    if let Err(e) = cli::run() {
        // the error line on stdout is best-effort; stderr always gets it
        let _ = cli::write_error(e.code_str(), e.message());
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
