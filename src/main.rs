//! henkan - terminal client for the image transformation service
//!
//! Reads endpoint configuration from flags or the environment, runs one
//! command and exits non-zero on failure.

use std::process::ExitCode;

use clap::Parser;
use henkan_client::cli::{Cli, run_cli};
use henkan_client::shared::logging::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays pipeable
    init_tracing(cli.global.verbose);

    match run_cli(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {}", error);
            for cause in error.chain().skip(1) {
                eprintln!("  caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}
