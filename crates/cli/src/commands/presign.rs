//! presign command - Generate a presigned download URL
//!
//! Signing happens locally; no request is sent to R2.

use std::time::Duration;

use cfr2_core::transfer;
use clap::Args;
use serde::Serialize;

use super::{MISSING_KEY, connect, fail, finish, load_config, required, resolve_bucket};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Generate a presigned download URL for an object
#[derive(Args, Debug)]
pub struct PresignArgs {
    /// R2 bucket name (defaults to DefaultBucket in config)
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Object key
    #[arg(short, long)]
    pub key: Option<String>,

    /// URL expiry time in hours
    #[arg(short, long, default_value_t = 24)]
    pub expiry: u64,
}

#[derive(Debug, Serialize)]
struct PresignOutput {
    bucket: String,
    key: String,
    url: String,
    expires_at: jiff::Timestamp,
    expiry_hours: u64,
}

/// Execute the presign command
pub async fn execute(args: PresignArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    finish(run(args, &formatter).await)
}

async fn run(args: PresignArgs, formatter: &Formatter) -> Result<(), ExitCode> {
    let config = load_config(formatter)?;
    let bucket = resolve_bucket(args.bucket, &config, formatter)?;
    let key = required(args.key, MISSING_KEY, formatter)?;
    let client = connect(&config, formatter).await?;
    let hours = args.expiry;

    formatter.println(&format!(
        "Generating presigned URL for '{key}' in bucket '{bucket}' with {hours}-hour expiry..."
    ));

    let expires_in = Duration::from_secs(hours.saturating_mul(3600));
    let presigned = transfer::presign(&client, &bucket, &key, expires_in)
        .await
        .map_err(|e| {
            fail(
                formatter,
                format!("Failed to generate presigned URL for object '{key}': {e}"),
            )
        })?;

    if formatter.is_json() {
        formatter.json(&PresignOutput {
            bucket,
            key,
            url: presigned.url,
            expires_at: presigned.expires_at,
            expiry_hours: hours,
        });
    } else if formatter.is_quiet() {
        // Quiet mode still prints the URL itself
        println!("{}", presigned.url);
    } else {
        println!("Presigned URL: {}", presigned.url);
    }

    Ok(())
}
