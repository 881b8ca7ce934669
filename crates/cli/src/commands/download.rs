//! download command - Download an object
//!
//! Streams an object into a local file with a live progress line.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cfr2_core::transfer;
use clap::Args;
use serde::Serialize;

use super::{MISSING_KEY, connect, fail, finish, load_config, required, resolve_bucket};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// Download an object to a local file
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// R2 bucket name (defaults to DefaultBucket in config)
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Object key to download
    #[arg(short, long)]
    pub key: Option<String>,

    /// Output file path or directory (defaults to the key in the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct DownloadOutput {
    status: &'static str,
    bucket: String,
    key: String,
    path: String,
    size_bytes: u64,
    size_human: String,
}

/// Execute the download command
pub async fn execute(args: DownloadArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    finish(run(args, &formatter).await)
}

async fn run(args: DownloadArgs, formatter: &Formatter) -> Result<(), ExitCode> {
    let config = load_config(formatter)?;
    let bucket = resolve_bucket(args.bucket, &config, formatter)?;
    let key = required(args.key, MISSING_KEY, formatter)?;
    let dest = resolve_download_path(&key, args.output.as_deref());
    let client = connect(&config, formatter).await?;

    formatter.println(&format!(
        "Downloading '{key}' from bucket '{bucket}' to '{}'...",
        dest.display()
    ));

    let progress = Arc::new(ProgressBar::new(formatter.clone()));
    let size = transfer::download(&client, &bucket, &key, &dest, progress)
        .await
        .map_err(|e| fail(formatter, format!("Failed to download object '{key}': {e}")))?;

    if formatter.is_json() {
        formatter.json(&DownloadOutput {
            status: "success",
            path: dest.display().to_string(),
            bucket,
            key,
            size_bytes: size,
            size_human: humansize::format_size(size, humansize::BINARY),
        });
    } else {
        formatter.success(&format!(
            "Successfully downloaded '{key}' to '{}'.",
            dest.display()
        ));
    }

    Ok(())
}

/// Pick the local file an object is written to
///
/// Without `-o` the key becomes a file name in the current directory, with
/// `/` replaced by `_`. When `-o` names an existing directory the key's last
/// segment is placed inside it. Any other `-o` is used verbatim.
pub fn resolve_download_path(key: &str, output: Option<&Path>) -> PathBuf {
    let flattened = || key.replace('/', "_");

    match output {
        None => PathBuf::from(flattened()),
        Some(dir) if dir.is_dir() => {
            let name = Path::new(key)
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| flattened().into());
            dir.join(name)
        }
        Some(path) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_flattens_key() {
        assert_eq!(
            resolve_download_path("photos/2024/cat.jpg", None),
            PathBuf::from("photos_2024_cat.jpg")
        );
        assert_eq!(resolve_download_path("a.txt", None), PathBuf::from("a.txt"));
    }

    #[test]
    fn test_existing_directory_uses_basename() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_download_path("photos/2024/cat.jpg", Some(dir.path())),
            dir.path().join("cat.jpg")
        );
    }

    #[test]
    fn test_explicit_file_path_is_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("renamed.jpg");
        assert_eq!(
            resolve_download_path("photos/cat.jpg", Some(&target)),
            target
        );
    }
}
