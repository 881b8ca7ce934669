//! CLI command definitions and execution
//!
//! Every command follows the same flow: load the configuration, resolve the
//! bucket and required flags, build the R2 client, then run one transfer
//! operation. The first failure is printed and ends the process with
//! [`ExitCode::GeneralError`].

use std::fmt::Display;

use cfr2_core::{Config, ConfigManager};
use cfr2_s3::R2Client;
use clap::{Parser, Subcommand};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod delete;
mod download;
mod list;
mod presign;
mod rename;
mod upload;

pub const MISSING_BUCKET: &str =
    "Bucket name not specified. Use -b or --bucket flag, or set DefaultBucket in config.";
pub const MISSING_KEY: &str = "Object key not specified. Use -k or --key flag.";

/// cfr2 - Cloudflare R2 command-line client
///
/// List, download, upload, delete, rename and presign objects in an R2
/// bucket. Credentials come from ~/.local/cfg/cfr2.toml or CFR2_*
/// environment variables.
#[derive(Parser, Debug)]
#[command(name = "cfr2")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true, arg_required_else_help = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all objects in a bucket
    List(list::ListArgs),

    /// Download an object to a local file
    Download(download::DownloadArgs),

    /// Upload a local file as an object
    Upload(upload::UploadArgs),

    /// Delete an object
    Delete(delete::DeleteArgs),

    /// Rename an object (copy, then delete the original)
    Rename(rename::RenameArgs),

    /// Generate a presigned download URL for an object
    Presign(presign::PresignArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::List(args) => list::execute(args, output_config).await,
        Commands::Download(args) => download::execute(args, output_config).await,
        Commands::Upload(args) => upload::execute(args, output_config).await,
        Commands::Delete(args) => delete::execute(args, output_config).await,
        Commands::Rename(args) => rename::execute(args, output_config).await,
        Commands::Presign(args) => presign::execute(args, output_config).await,
    }
}

/// Print `message` as an error and return the failure exit code
pub(crate) fn fail(formatter: &Formatter, message: impl Display) -> ExitCode {
    formatter.error(&message.to_string());
    ExitCode::GeneralError
}

/// Load and validate the configuration from file and environment
pub(crate) fn load_config(formatter: &Formatter) -> Result<Config, ExitCode> {
    ConfigManager::new().load().map_err(|e| fail(formatter, e))
}

/// The `-b` flag if given, else the configured default bucket
pub(crate) fn resolve_bucket(
    flag: Option<String>,
    config: &Config,
    formatter: &Formatter,
) -> Result<String, ExitCode> {
    let bucket = flag.unwrap_or_else(|| config.default_bucket.clone());
    required(Some(bucket), MISSING_BUCKET, formatter)
}

/// Reject a flag that is absent or empty
pub(crate) fn required(
    value: Option<String>,
    message: &str,
    formatter: &Formatter,
) -> Result<String, ExitCode> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| fail(formatter, message))
}

/// Build the R2 client for a validated configuration
pub(crate) async fn connect(config: &Config, formatter: &Formatter) -> Result<R2Client, ExitCode> {
    tracing::debug!(account_id = %config.account_id, "connecting to R2");
    R2Client::new(config).await.map_err(|e| fail(formatter, e))
}

/// Collapse a command body's result into an exit code
pub(crate) fn finish(result: Result<(), ExitCode>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::Success,
        Err(code) => code,
    }
}
