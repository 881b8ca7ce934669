//! upload command - Upload a local file
//!
//! Large files are sent as a multipart upload by the R2 client.

use std::path::PathBuf;
use std::sync::Arc;

use cfr2_core::transfer;
use clap::Args;
use serde::Serialize;

use super::{MISSING_KEY, connect, fail, finish, load_config, required, resolve_bucket};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

const MISSING_FILE: &str = "File path not specified. Use -f or --file flag.";

/// Upload a local file as an object
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// R2 bucket name (defaults to DefaultBucket in config)
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Local file to upload
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Object key for the uploaded file
    #[arg(short, long)]
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
struct UploadOutput {
    status: &'static str,
    bucket: String,
    key: String,
    file: String,
    size_bytes: u64,
    size_human: String,
    url: String,
}

/// Execute the upload command
pub async fn execute(args: UploadArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    finish(run(args, &formatter).await)
}

async fn run(args: UploadArgs, formatter: &Formatter) -> Result<(), ExitCode> {
    let config = load_config(formatter)?;
    let bucket = resolve_bucket(args.bucket, &config, formatter)?;
    let file = args
        .file
        .filter(|f| !f.as_os_str().is_empty())
        .ok_or_else(|| fail(formatter, MISSING_FILE))?;
    let key = required(args.key, MISSING_KEY, formatter)?;
    let client = connect(&config, formatter).await?;

    formatter.println(&format!(
        "Uploading '{}' to bucket '{bucket}' as '{key}'...",
        file.display()
    ));

    let progress = Arc::new(ProgressBar::new(formatter.clone()));
    let size = transfer::upload(&client, &bucket, &key, &file, progress)
        .await
        .map_err(|e| {
            fail(
                formatter,
                format!("Failed to upload file '{}': {e}", file.display()),
            )
        })?;

    if formatter.is_json() {
        let url = cfr2_s3::object_url(&config.account_id, &bucket, &key)
            .map_err(|e| fail(formatter, e))?;
        formatter.json(&UploadOutput {
            status: "success",
            file: file.display().to_string(),
            bucket,
            key,
            size_bytes: size,
            size_human: humansize::format_size(size, humansize::BINARY),
            url,
        });
    } else {
        formatter.success(&format!(
            "Successfully uploaded '{}' to '{key}'.",
            file.display()
        ));
    }

    Ok(())
}
