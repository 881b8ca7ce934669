//! Transfer operations
//!
//! Each function performs one user-level operation against an [`ObjectStore`].
//! Byte transfers run through the progress decorators. Nothing here retries;
//! the first failure is returned with its context.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::progress::{ProgressObserver, ProgressReader, ProgressWriter, TransferProgress};
use crate::traits::{ObjectInfo, ObjectStore, PresignedUrl};

/// Presigned URL lifetime when the caller does not choose one
pub const DEFAULT_PRESIGN_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// List every object in `bucket`, draining all pages
///
/// All-or-nothing: a failure on any page discards the pages already fetched.
pub async fn list_objects<S>(store: &S, bucket: &str) -> Result<Vec<ObjectInfo>>
where
    S: ObjectStore + ?Sized,
{
    let mut objects = Vec::new();
    let mut continuation_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = store.list_page(bucket, continuation_token.take()).await?;
        pages += 1;
        objects.extend(page.items);

        match page.continuation_token {
            Some(token) if page.truncated => continuation_token = Some(token),
            _ => break,
        }
    }

    tracing::debug!(bucket, pages, objects = objects.len(), "listing complete");
    Ok(objects)
}

/// Download `key` into the local file `dest`
///
/// The destination is created or truncated. A partially written file is left
/// in place if the transfer fails. Returns the number of bytes written.
pub async fn download<S>(
    store: &S,
    bucket: &str,
    key: &str,
    dest: &Path,
    observer: Arc<dyn ProgressObserver>,
) -> Result<u64>
where
    S: ObjectStore + ?Sized,
{
    let body = store.get_object(bucket, key).await?;

    let file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| Error::io(format!("failed to create local file '{}'", dest.display()), e))?;

    if body.content_length.is_none() {
        observer.warn("ContentLength not available, download progress percentage will not be shown.");
    }

    let progress = Arc::new(TransferProgress::new(body.content_length));
    let mut writer = ProgressWriter::new(file, Arc::clone(&progress), Arc::clone(&observer));
    let mut reader = body.reader;

    let write_err = |e: std::io::Error| {
        Error::io(format!("failed to write object content to file '{}'", dest.display()), e)
    };
    let copied = tokio::io::copy(&mut reader, &mut writer)
        .await
        .map_err(write_err)?;
    writer.flush().await.map_err(write_err)?;

    observer.finish(&progress);
    tracing::debug!(bucket, key, bytes = copied, dest = %dest.display(), "download complete");
    Ok(copied)
}

/// Upload the local file `source` as `key`
///
/// Returns the number of bytes uploaded.
pub async fn upload<S>(
    store: &S,
    bucket: &str,
    key: &str,
    source: &Path,
    observer: Arc<dyn ProgressObserver>,
) -> Result<u64>
where
    S: ObjectStore + ?Sized,
{
    let file = tokio::fs::File::open(source)
        .await
        .map_err(|e| Error::io(format!("failed to open local file '{}'", source.display()), e))?;

    let metadata = file
        .metadata()
        .await
        .map_err(|e| Error::io(format!("failed to get file info for '{}'", source.display()), e))?;
    if metadata.is_dir() {
        return Err(Error::io(
            format!("failed to open local file '{}'", source.display()),
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "is a directory"),
        ));
    }
    let size = metadata.len();

    let progress = Arc::new(TransferProgress::new(Some(size)));
    let reader = ProgressReader::new(file, Arc::clone(&progress), Arc::clone(&observer));

    store.put_object(bucket, key, Box::new(reader), size).await?;

    observer.finish(&progress);
    tracing::debug!(bucket, key, bytes = size, source = %source.display(), "upload complete");
    Ok(size)
}

/// Delete `key` from `bucket`
pub async fn delete<S>(store: &S, bucket: &str, key: &str) -> Result<()>
where
    S: ObjectStore + ?Sized,
{
    store.delete_object(bucket, key).await
}

/// Rename `old_key` to `new_key` by copying then deleting the original
///
/// Not atomic. If the copy fails nothing changed. If the delete fails both
/// keys exist and [`Error::RenameIncomplete`] is returned; the copy is not
/// rolled back.
pub async fn rename<S>(store: &S, bucket: &str, old_key: &str, new_key: &str) -> Result<()>
where
    S: ObjectStore + ?Sized,
{
    if old_key == new_key {
        return Err(Error::InvalidArgument(format!(
            "old and new object keys are both '{old_key}'"
        )));
    }

    store.copy_object(bucket, old_key, new_key).await?;

    if let Err(e) = store.delete_object(bucket, old_key).await {
        tracing::warn!(
            bucket,
            old_key,
            new_key,
            "rename left both keys in place: {e}"
        );
        return Err(Error::RenameIncomplete {
            bucket: bucket.to_string(),
            old_key: old_key.to_string(),
            new_key: new_key.to_string(),
            message: e.to_string(),
        });
    }

    Ok(())
}

/// Generate a presigned GET URL for `key`
pub async fn presign<S>(
    store: &S,
    bucket: &str,
    key: &str,
    expires_in: Duration,
) -> Result<PresignedUrl>
where
    S: ObjectStore + ?Sized,
{
    store.presign_get(bucket, key, expires_in).await
}
