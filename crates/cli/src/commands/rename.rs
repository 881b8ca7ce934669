//! rename command - Rename an object
//!
//! Copies the object to the new key, then deletes the old key. The two steps
//! are not atomic: if the delete fails both keys remain and the error says so.

use cfr2_core::transfer;
use clap::Args;
use serde::Serialize;

use super::{connect, fail, finish, load_config, required, resolve_bucket};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

const MISSING_OLD_KEY: &str = "Old object key not specified. Use -o or --old-key flag.";
const MISSING_NEW_KEY: &str = "New object key not specified. Use -n or --new-key flag.";

/// Rename an object within a bucket
#[derive(Args, Debug)]
pub struct RenameArgs {
    /// R2 bucket name (defaults to DefaultBucket in config)
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Current object key
    #[arg(short, long)]
    pub old_key: Option<String>,

    /// New object key
    #[arg(short, long)]
    pub new_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct RenameOutput {
    status: &'static str,
    bucket: String,
    old_key: String,
    new_key: String,
}

/// Execute the rename command
pub async fn execute(args: RenameArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    finish(run(args, &formatter).await)
}

async fn run(args: RenameArgs, formatter: &Formatter) -> Result<(), ExitCode> {
    let config = load_config(formatter)?;
    let bucket = resolve_bucket(args.bucket, &config, formatter)?;
    let old_key = required(args.old_key, MISSING_OLD_KEY, formatter)?;
    let new_key = required(args.new_key, MISSING_NEW_KEY, formatter)?;
    let client = connect(&config, formatter).await?;

    formatter.println(&format!(
        "Renaming '{old_key}' to '{new_key}' in bucket '{bucket}'..."
    ));

    transfer::rename(&client, &bucket, &old_key, &new_key)
        .await
        .map_err(|e| {
            if e.is_partial() {
                formatter.warning(&format!(
                    "'{old_key}' and '{new_key}' both exist in bucket '{bucket}'; delete one manually"
                ));
            }
            fail(
                formatter,
                format!("Failed to rename object '{old_key}' to '{new_key}': {e}"),
            )
        })?;

    if formatter.is_json() {
        formatter.json(&RenameOutput {
            status: "success",
            bucket,
            old_key,
            new_key,
        });
    } else {
        formatter.success(&format!(
            "Successfully renamed '{old_key}' to '{new_key}' in '{bucket}'."
        ));
    }

    Ok(())
}
