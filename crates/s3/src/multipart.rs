//! Sequential multipart uploads
//!
//! Bodies above [`MultipartConfig::threshold`] are cut into parts and sent
//! one at a time. Any failure after the upload was created aborts it, so no
//! orphaned parts are left billed in the bucket.

use async_trait::async_trait;
use aws_sdk_s3::types::CompletedPart;
use tokio::io::AsyncReadExt;

use cfr2_core::{BoxedReader, Error, Result};

/// Part size used when the body fits within the part limit: 16 MiB
pub const DEFAULT_PART_SIZE: u64 = 16 * 1024 * 1024;

/// R2 rejects non-final parts smaller than 5 MiB
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Upper bound for a single part: 5 GiB
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Parts per upload are capped at 10,000
pub const MAX_PARTS: u64 = 10_000;

/// When and how a body is split into parts
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Preferred part size in bytes
    pub part_size: u64,

    /// Bodies larger than this are sent as multipart uploads
    pub threshold: u64,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            threshold: DEFAULT_PART_SIZE,
        }
    }
}

impl MultipartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part_size(mut self, size: u64) -> Self {
        self.part_size = size.clamp(MIN_PART_SIZE, MAX_PART_SIZE);
        self
    }

    /// Never below one minimum part, since a single part must reach it
    pub fn threshold(mut self, size: u64) -> Self {
        self.threshold = size.max(MIN_PART_SIZE);
        self
    }

    /// Whether a body of `size` bytes needs a multipart upload
    pub fn use_multipart(&self, size: u64) -> bool {
        size > self.threshold
    }

    /// Part size for a body of `size` bytes
    ///
    /// The preferred size, grown when the body would otherwise need more
    /// than [`MAX_PARTS`] parts.
    pub fn part_size_for(&self, size: u64) -> u64 {
        let fitted = size.div_ceil(MAX_PARTS);
        self.part_size.max(fitted).clamp(MIN_PART_SIZE, MAX_PART_SIZE)
    }
}

/// The four calls a multipart upload is made of
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MultipartApi: Send + Sync {
    /// Start an upload and return its ID
    async fn create(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<String>,
    ) -> Result<String>;

    async fn send_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Vec<u8>,
    ) -> Result<CompletedPart>;

    async fn complete(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<()>;

    async fn abort(&self, bucket: &str, key: &str, upload_id: &str) -> Result<()>;
}

/// Upload exactly `size` bytes of `body` as a multipart upload
///
/// A body shorter than `size` fails with an `UnexpectedEof` I/O error.
pub async fn upload_multipart<A>(
    api: &A,
    config: &MultipartConfig,
    bucket: &str,
    key: &str,
    mut body: BoxedReader,
    size: u64,
    content_type: Option<&str>,
) -> Result<()>
where
    A: MultipartApi + ?Sized,
{
    let upload_id = api
        .create(bucket, key, content_type.map(str::to_string))
        .await?;

    let result = match upload_parts(api, config, bucket, key, &upload_id, &mut body, size).await
    {
        Ok(parts) => api.complete(bucket, key, &upload_id, parts).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        if let Err(abort_err) = api.abort(bucket, key, &upload_id).await {
            tracing::warn!(
                bucket,
                key,
                upload_id,
                error = %abort_err,
                "failed to abort multipart upload"
            );
        }
        return Err(e);
    }

    Ok(())
}

async fn upload_parts<A>(
    api: &A,
    config: &MultipartConfig,
    bucket: &str,
    key: &str,
    upload_id: &str,
    body: &mut BoxedReader,
    size: u64,
) -> Result<Vec<CompletedPart>>
where
    A: MultipartApi + ?Sized,
{
    let part_size = config.part_size_for(size);
    let total_parts = size.div_ceil(part_size);
    let read_context = || format!("failed to read upload data for '{key}'");

    let mut parts = Vec::with_capacity(total_parts as usize);
    let mut sent = 0u64;

    for part_number in 1..=total_parts as i32 {
        let len = part_size.min(size - sent);
        let mut data = Vec::with_capacity(len as usize);
        (&mut *body)
            .take(len)
            .read_to_end(&mut data)
            .await
            .map_err(|e| Error::io(read_context(), e))?;

        let read = data.len() as u64;
        if read < len {
            return Err(Error::io(
                read_context(),
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("source ended after {} of {size} bytes", sent + read),
                ),
            ));
        }

        tracing::debug!(bucket, key, part_number, total_parts, len, "uploading part");
        parts.push(
            api.send_part(bucket, key, upload_id, part_number, data)
                .await?,
        );
        sent += len;
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;
    use mockall::predicate::eq;

    const MIB: u64 = 1024 * 1024;

    fn body(len: u64) -> BoxedReader {
        Box::new(std::io::Cursor::new(vec![7u8; len as usize]))
    }

    fn small_parts() -> MultipartConfig {
        MultipartConfig::new().part_size(MIN_PART_SIZE).threshold(MIN_PART_SIZE)
    }

    fn part(part_number: i32) -> Result<CompletedPart> {
        Ok(CompletedPart::builder()
            .part_number(part_number)
            .e_tag(format!("etag-{part_number}"))
            .build())
    }

    #[test]
    fn test_threshold_boundary() {
        let config = MultipartConfig::default();
        assert!(!config.use_multipart(0));
        assert!(!config.use_multipart(16 * MIB));
        assert!(config.use_multipart(16 * MIB + 1));
    }

    #[test]
    fn test_threshold_not_below_min_part() {
        let config = MultipartConfig::new().threshold(1);
        assert_eq!(config.threshold, MIN_PART_SIZE);
        assert!(!config.use_multipart(MIN_PART_SIZE));
        assert!(config.use_multipart(MIN_PART_SIZE + 1));
    }

    #[test]
    fn test_part_size_for_small_and_huge_bodies() {
        let config = MultipartConfig::default();
        assert_eq!(config.part_size_for(20 * MIB), DEFAULT_PART_SIZE);

        // 1 TiB at 16 MiB would need 65,536 parts
        let huge = 1024 * 1024 * MIB;
        let size = config.part_size_for(huge);
        assert!(size > DEFAULT_PART_SIZE);
        assert!(huge.div_ceil(size) <= MAX_PARTS);
    }

    #[tokio::test]
    async fn test_uploads_parts_in_order_then_completes() {
        let mut api = MockMultipartApi::new();
        let mut seq = Sequence::new();

        api.expect_create()
            .with(eq("b"), eq("big.bin"), eq(Some("application/octet-stream".to_string())))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok("upload-1".to_string()));
        for (number, len) in [(1, 5 * MIB), (2, 5 * MIB), (3, 2 * MIB)] {
            api.expect_send_part()
                .withf(move |_, _, id, n, data| {
                    id == "upload-1" && *n == number && data.len() as u64 == len
                })
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _, _, n, _| part(n));
        }
        api.expect_complete()
            .withf(|_, _, id, parts| {
                id == "upload-1"
                    && parts
                        .iter()
                        .map(|p| p.part_number())
                        .eq([Some(1), Some(2), Some(3)])
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(()));
        api.expect_abort().times(0);

        upload_multipart(
            &api,
            &small_parts(),
            "b",
            "big.bin",
            body(12 * MIB),
            12 * MIB,
            Some("application/octet-stream"),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_short_source_aborts_with_unexpected_eof() {
        let mut api = MockMultipartApi::new();
        api.expect_create()
            .returning(|_, _, _| Ok("upload-2".to_string()));
        api.expect_send_part()
            .times(1)
            .returning(|_, _, _, n, _| part(n));
        api.expect_complete().times(0);
        api.expect_abort()
            .withf(|_, _, id| id == "upload-2")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let err = upload_multipart(
            &api,
            &small_parts(),
            "b",
            "k",
            body(7 * MIB),
            12 * MIB,
            None,
        )
        .await
        .unwrap_err();

        match err {
            Error::Io { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::UnexpectedEof);
                assert!(source.to_string().contains("after 7340032 of 12582912 bytes"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_part_failure_aborts() {
        let mut api = MockMultipartApi::new();
        api.expect_create()
            .returning(|_, _, _| Ok("upload-3".to_string()));
        api.expect_send_part()
            .withf(|_, _, _, n, _| *n == 1)
            .times(1)
            .returning(|_, _, _, n, _| part(n));
        api.expect_send_part()
            .withf(|_, _, _, n, _| *n == 2)
            .times(1)
            .returning(|_, _, _, _, _| {
                Err(Error::store("failed to upload part 2", "InternalError"))
            });
        api.expect_complete().times(0);
        api.expect_abort().times(1).returning(|_, _, _| Ok(()));

        let err = upload_multipart(
            &api,
            &small_parts(),
            "b",
            "k",
            body(12 * MIB),
            12 * MIB,
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "failed to upload part 2: InternalError");
    }

    #[tokio::test]
    async fn test_complete_failure_aborts_and_keeps_original_error() {
        let mut api = MockMultipartApi::new();
        api.expect_create()
            .returning(|_, _, _| Ok("upload-4".to_string()));
        api.expect_send_part()
            .times(2)
            .returning(|_, _, _, n, _| part(n));
        api.expect_complete()
            .times(1)
            .returning(|_, _, _, _| Err(Error::store("failed to complete", "InvalidPart")));
        api.expect_abort()
            .times(1)
            .returning(|_, _, _| Err(Error::store("failed to abort", "NoSuchUpload")));

        let err = upload_multipart(
            &api,
            &small_parts(),
            "b",
            "k",
            body(6 * MIB),
            6 * MIB,
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "failed to complete: InvalidPart");
    }

    #[tokio::test]
    async fn test_create_failure_sends_nothing() {
        let mut api = MockMultipartApi::new();
        api.expect_create()
            .returning(|_, _, _| Err(Error::store("failed to create", "AccessDenied")));
        api.expect_send_part().times(0);
        api.expect_abort().times(0);

        let result = upload_multipart(
            &api,
            &small_parts(),
            "b",
            "k",
            body(6 * MIB),
            6 * MIB,
            None,
        )
        .await;
        assert!(result.is_err());
    }
}
