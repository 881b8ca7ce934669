//! R2 endpoint and URL helpers
//!
//! R2 is addressed per account: `https://{account_id}.r2.cloudflarestorage.com`.
//! There is no region segment; the SDK is given the placeholder region
//! [`R2_REGION`] and the endpoint is overridden.
//!
//! Object keys are opaque. `.` and `..` segments and empty segments are part
//! of the key and are encoded as-is, never resolved.

use cfr2_core::{Error, Result};
use url::Url;

/// Host suffix shared by every R2 account endpoint
pub const R2_HOST: &str = "r2.cloudflarestorage.com";

/// Region placeholder accepted by R2
pub const R2_REGION: &str = "auto";

/// Endpoint URL for an account
pub fn endpoint_url(account_id: &str) -> String {
    format!("https://{account_id}.{R2_HOST}")
}

/// Parse and check the endpoint for an account
pub fn parse_endpoint(account_id: &str) -> Result<Url> {
    let endpoint = endpoint_url(account_id);
    let url = Url::parse(&endpoint)
        .map_err(|e| Error::Client(format!("invalid endpoint '{endpoint}': {e}")))?;
    let expected_host = &endpoint["https://".len()..];
    if !url
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case(expected_host))
    {
        return Err(Error::Client(format!(
            "invalid endpoint '{endpoint}': account ID must be a plain host label"
        )));
    }
    Ok(url)
}

/// Path-style URL of a bucket
pub fn bucket_url(account_id: &str, bucket: &str) -> Result<String> {
    parse_endpoint(account_id)?;
    Ok(format!(
        "{}/{}",
        endpoint_url(account_id),
        urlencoding::encode(bucket)
    ))
}

/// Path-style URL of an object; the key is escaped as a single segment
pub fn object_url(account_id: &str, bucket: &str, key: &str) -> Result<String> {
    Ok(format!(
        "{}/{}",
        bucket_url(account_id, bucket)?,
        urlencoding::encode(key)
    ))
}

/// Value of the `x-amz-copy-source` header for `bucket/key`
///
/// Each key segment is percent-encoded; the `/` separators are kept.
pub fn copy_source(bucket: &str, key: &str) -> String {
    let segments: Vec<_> = key.split('/').map(urlencoding::encode).collect();
    format!("{}/{}", urlencoding::encode(bucket), segments.join("/"))
}
