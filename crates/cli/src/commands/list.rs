//! list command - List objects
//!
//! Prints every object in a bucket as `key | size`.

use cfr2_core::{ObjectInfo, transfer};
use clap::Args;
use serde::Serialize;

use super::{connect, fail, finish, load_config, resolve_bucket};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List all objects in a bucket
#[derive(Args, Debug)]
pub struct ListArgs {
    /// R2 bucket name (defaults to DefaultBucket in config)
    #[arg(short, long)]
    pub bucket: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListOutput {
    bucket: String,
    url: String,
    objects: Vec<ObjectInfo>,
    total: usize,
}

/// Execute the list command
pub async fn execute(args: ListArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    finish(run(args, &formatter).await)
}

async fn run(args: ListArgs, formatter: &Formatter) -> Result<(), ExitCode> {
    let config = load_config(formatter)?;
    let bucket = resolve_bucket(args.bucket, &config, formatter)?;
    let client = connect(&config, formatter).await?;

    let objects = transfer::list_objects(&client, &bucket).await.map_err(|e| {
        fail(
            formatter,
            format!("Failed to list objects in bucket '{bucket}': {e}"),
        )
    })?;

    if formatter.is_json() {
        let url = cfr2_s3::bucket_url(&config.account_id, &bucket)
            .map_err(|e| fail(formatter, e))?;
        formatter.json(&ListOutput {
            total: objects.len(),
            bucket,
            url,
            objects,
        });
        return Ok(());
    }

    if objects.is_empty() {
        formatter.println("No objects found in the bucket.");
        return Ok(());
    }

    for object in &objects {
        formatter.println(&format_line(object));
    }

    Ok(())
}

fn format_line(object: &ObjectInfo) -> String {
    format!("{} | {}", object.key, object.size_display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        let object = ObjectInfo::new("docs/a.txt", Some(11));
        assert_eq!(format_line(&object), "docs/a.txt | 11");
    }

    #[test]
    fn test_json_output_includes_bucket_url() {
        let output = ListOutput {
            bucket: "photos".to_string(),
            url: cfr2_s3::bucket_url("abc123", "photos").unwrap(),
            objects: vec![ObjectInfo::new("a.txt", Some(1))],
            total: 1,
        };

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["url"], "https://abc123.r2.cloudflarestorage.com/photos");
        assert_eq!(json["objects"][0]["key"], "a.txt");
        assert_eq!(json["total"], 1);
    }

    #[test]
    fn test_format_line_without_size() {
        let object = ObjectInfo::new("mystery", None);
        assert_eq!(format_line(&object), "mystery | N/A");
    }
}
