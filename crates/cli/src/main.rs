//! cfr2 - Cloudflare R2 CLI client
//!
//! A command-line interface for listing, transferring, renaming and
//! presigning objects in Cloudflare R2 buckets.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cfr2_cli::commands::{self, Cli};
use cfr2_cli::exit_code::ExitCode;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; every other
            // parse failure, including a missing command, exits 1.
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::GeneralError
            } else {
                ExitCode::Success
            };
            std::process::exit(code.as_i32());
        }
    };

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
