//! ObjectStore trait definition
//!
//! This trait defines the interface for the object-store calls the transfer
//! operations need. It keeps the CLI and the transfer layer decoupled from
//! the S3 SDK, and lets tests substitute an in-memory or mocked store.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::error::Result;

/// Owned, type-erased byte stream passed across the store boundary
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Descriptor of a stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key, '/'-separated
    pub key: String,

    /// Size in bytes; listings may omit it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,

    /// ETag without surrounding quotes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl ObjectInfo {
    pub fn new(key: impl Into<String>, size: Option<i64>) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified: None,
            etag: None,
        }
    }

    /// Size as shown in listings, `N/A` when unknown
    pub fn size_display(&self) -> String {
        self.size
            .map(|s| s.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// One page of a bucket listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Objects on this page, in listing order
    pub items: Vec<ObjectInfo>,

    /// Whether more pages follow
    pub truncated: bool,

    /// Token for the next page
    pub continuation_token: Option<String>,
}

/// Streaming body of a fetched object
pub struct ObjectBody {
    /// Value of the Content-Length header, when the store sent one
    pub content_length: Option<u64>,

    pub reader: BoxedReader,
}

impl std::fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// A time-limited GET URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_at: jiff::Timestamp,
}

/// Object-store operations used by cfr2
///
/// Implemented by the R2 adapter in `cfr2-s3`; mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one page of a ListObjectsV2 listing
    async fn list_page(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage>;

    /// Open an object for streaming download
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody>;

    /// Stream `size` bytes from `body` into a new object
    ///
    /// Large bodies are sent as a multipart upload by the implementation.
    async fn put_object(&self, bucket: &str, key: &str, body: BoxedReader, size: u64)
        -> Result<()>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Server-side copy within one bucket
    async fn copy_object(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<()>;

    /// Presign a GET request valid for `expires_in`
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_info_size_display() {
        let info = ObjectInfo::new("docs/a.txt", Some(1024));
        assert_eq!(info.key, "docs/a.txt");
        assert_eq!(info.size_display(), "1024");

        let info = ObjectInfo::new("docs/b.txt", None);
        assert_eq!(info.size_display(), "N/A");
    }

    #[test]
    fn test_object_info_json_skips_missing_fields() {
        let info = ObjectInfo::new("a.txt", None);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json, serde_json::json!({ "key": "a.txt" }));
    }
}
