//! Integration tests for the cfr2 CLI against a real R2 bucket
//!
//! These tests create, rename and delete objects under a unique prefix in
//! the configured bucket.
//!
//! Run with:
//! ```bash
//! export CFR2_ACCOUNT_ID=... CFR2_ACCESS_KEY_ID=... \
//!        CFR2_SECRET_ACCESS_KEY=... CFR2_DEFAULT_BUCKET=...
//! cargo test -p cfr2-cli --features integration
//! ```

#![cfg(feature = "integration")]

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const REQUIRED_VARS: [&str; 4] = [
    "CFR2_ACCOUNT_ID",
    "CFR2_ACCESS_KEY_ID",
    "CFR2_SECRET_ACCESS_KEY",
    "CFR2_DEFAULT_BUCKET",
];

fn credentials_available() -> bool {
    REQUIRED_VARS
        .iter()
        .all(|var| std::env::var(var).is_ok_and(|v| !v.is_empty()))
}

/// Run cfr2 with the caller's credentials and no config file
fn run_cfr2(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cfr2"))
        .args(args)
        .arg("--no-progress")
        .current_dir(dir)
        .env("CFR2_CONFIG_FILE", dir.join("absent.toml"))
        .output()
        .expect("Failed to execute cfr2 command")
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Listed sizes keyed by object key
fn list_keys(dir: &Path) -> Vec<(String, String)> {
    let output = run_cfr2(&["list"], dir);
    assert_success(&output, "list");
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| line.split_once(" | "))
        .map(|(key, size)| (key.to_string(), size.to_string()))
        .collect()
}

fn unique_prefix() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("cfr2-test-{nanos}")
}

#[test]
fn test_object_lifecycle() {
    if !credentials_available() {
        eprintln!("Skipping: CFR2_* credentials not set");
        return;
    }

    let dir = TempDir::new().unwrap();
    let prefix = unique_prefix();
    let key = format!("{prefix}/hello world.txt");
    let renamed = format!("{prefix}/renamed.txt");
    let content = b"Hello from cfr2 integration tests\n";

    let source = dir.path().join("source.txt");
    std::fs::write(&source, content).unwrap();

    // upload then list
    let output = run_cfr2(&["upload", "-f", source.to_str().unwrap(), "-k", &key], dir.path());
    assert_success(&output, "upload");
    let listed = list_keys(dir.path());
    assert!(listed.contains(&(key.clone(), content.len().to_string())));

    // download preserves bytes
    let target = dir.path().join("downloaded.txt");
    let output = run_cfr2(&["download", "-k", &key, "-o", target.to_str().unwrap()], dir.path());
    assert_success(&output, "download");
    assert_eq!(std::fs::read(&target).unwrap(), content);

    // download without -o flattens the key into the working directory
    let output = run_cfr2(&["download", "-k", &key], dir.path());
    assert_success(&output, "download to default path");
    let flattened = dir.path().join(key.replace('/', "_"));
    assert_eq!(std::fs::read(flattened).unwrap(), content);

    // rename moves the object
    let output = run_cfr2(&["rename", "-o", &key, "-n", &renamed], dir.path());
    assert_success(&output, "rename");
    let listed = list_keys(dir.path());
    assert!(!listed.iter().any(|(k, _)| k == &key));
    assert!(listed.contains(&(renamed.clone(), content.len().to_string())));

    // presign yields a URL for the renamed object
    let output = run_cfr2(&["presign", "-q", "-k", &renamed, "-e", "1"], dir.path());
    assert_success(&output, "presign");
    let url = String::from_utf8_lossy(&output.stdout);
    assert!(url.contains("X-Amz-Expires=3600"));

    // delete, then deleting again still succeeds
    for _ in 0..2 {
        let output = run_cfr2(&["delete", "-k", &renamed], dir.path());
        assert_success(&output, "delete");
    }
    assert!(!list_keys(dir.path()).iter().any(|(k, _)| k == &renamed));
}

#[test]
fn test_download_missing_object_fails() {
    if !credentials_available() {
        eprintln!("Skipping: CFR2_* credentials not set");
        return;
    }

    let dir = TempDir::new().unwrap();
    let key = format!("{}/does-not-exist", unique_prefix());
    let output = run_cfr2(&["download", "-k", &key], dir.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to download object"));
    assert!(!dir.path().join(key.replace('/', "_")).exists());
}
