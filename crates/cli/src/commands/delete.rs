//! delete command - Delete an object

use cfr2_core::transfer;
use clap::Args;
use serde::Serialize;

use super::{MISSING_KEY, connect, fail, finish, load_config, required, resolve_bucket};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Delete an object
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// R2 bucket name (defaults to DefaultBucket in config)
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Object key to delete
    #[arg(short, long)]
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    status: &'static str,
    bucket: String,
    key: String,
}

/// Execute the delete command
pub async fn execute(args: DeleteArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    finish(run(args, &formatter).await)
}

async fn run(args: DeleteArgs, formatter: &Formatter) -> Result<(), ExitCode> {
    let config = load_config(formatter)?;
    let bucket = resolve_bucket(args.bucket, &config, formatter)?;
    let key = required(args.key, MISSING_KEY, formatter)?;
    let client = connect(&config, formatter).await?;

    formatter.println(&format!("Deleting '{key}' from bucket '{bucket}'..."));

    transfer::delete(&client, &bucket, &key)
        .await
        .map_err(|e| fail(formatter, format!("Failed to delete object '{key}': {e}")))?;

    if formatter.is_json() {
        formatter.json(&DeleteOutput {
            status: "success",
            bucket,
            key,
        });
    } else {
        formatter.success(&format!("Successfully deleted '{key}' from '{bucket}'."));
    }

    Ok(())
}
