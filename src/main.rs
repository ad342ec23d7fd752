//! Atencion CLI
//!
//! # Usage
//!
//! ```bash
//! # Run every seed of a spec
//! atencion run sst2.yaml
//!
//! # Run with overrides
//! atencion run sst2.yaml --seeds 1,2 --epochs 5 --lr 0.005
//!
//! # Validate a spec (and its paths)
//! atencion validate sst2.yaml --paths
//!
//! # Show the resolved spec
//! atencion info sst2.yaml --format yaml
//! ```

use atencion::cli::{run_command, Cli, LogLevel};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    LogLevel::from_flags(cli.verbose, cli.quiet).init_tracing();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
