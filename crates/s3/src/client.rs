//! R2 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from cfr2-core.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{RequestChecksumCalculation, ResponseChecksumValidation};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use jiff::{SignedDuration, Timestamp};
use tokio::io::AsyncReadExt;

use cfr2_core::{
    BoxedReader, Config, Error, ListPage, ObjectBody, ObjectInfo, ObjectStore, PresignedUrl,
    Result,
};

use crate::endpoint::{self, R2_REGION};
use crate::multipart::{MultipartApi, MultipartConfig, upload_multipart};

/// R2 client wrapper
pub struct R2Client {
    inner: aws_sdk_s3::Client,
    multipart: MultipartConfig,
}

impl R2Client {
    /// Create a new R2 client from a validated configuration
    pub async fn new(config: &Config) -> Result<Self> {
        let endpoint = endpoint::parse_endpoint(&config.account_id)?;

        let credentials = aws_credential_types::Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None, // session token
            None, // expiry
            "cfr2-static-credentials",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(R2_REGION))
            .endpoint_url(endpoint.as_str().trim_end_matches('/'))
            .load()
            .await;

        // R2 only honors checksums that were explicitly requested
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        tracing::debug!(endpoint = %endpoint, "R2 client created");

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            multipart: MultipartConfig::default(),
        })
    }

    async fn put_single(
        &self,
        bucket: &str,
        key: &str,
        mut body: BoxedReader,
        size: u64,
        content_type: Option<&str>,
    ) -> Result<()> {
        let mut data = Vec::with_capacity(usize::try_from(size).unwrap_or_default());
        body.read_to_end(&mut data)
            .await
            .map_err(|e| Error::io(format!("failed to read upload data for '{key}'"), e))?;

        self.inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .set_content_type(content_type.map(str::to_string))
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                Error::store(
                    format!("failed to upload object '{key}' to bucket '{bucket}'"),
                    DisplayErrorContext(&e),
                )
            })?;

        Ok(())
    }
}

#[async_trait]
impl MultipartApi for aws_sdk_s3::Client {
    async fn create(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<String>,
    ) -> Result<String> {
        let context = format!("failed to start multipart upload of '{key}' to bucket '{bucket}'");

        let created = self
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .set_content_type(content_type)
            .send()
            .await
            .map_err(|e| Error::store(&context, DisplayErrorContext(&e)))?;

        created
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| Error::store(&context, "response did not include an upload ID"))
    }

    async fn send_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Vec<u8>,
    ) -> Result<CompletedPart> {
        let uploaded = self
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                Error::store(
                    format!(
                        "failed to upload part {part_number} of object '{key}' to bucket '{bucket}'"
                    ),
                    DisplayErrorContext(&e),
                )
            })?;

        Ok(CompletedPart::builder()
            .part_number(part_number)
            .set_e_tag(uploaded.e_tag().map(str::to_string))
            .build())
    }

    async fn complete(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<()> {
        self.complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                Error::store(
                    format!("failed to upload object '{key}' to bucket '{bucket}'"),
                    DisplayErrorContext(&e),
                )
            })?;

        Ok(())
    }

    async fn abort(&self, bucket: &str, key: &str, upload_id: &str) -> Result<()> {
        self.abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| {
                Error::store(
                    format!("failed to abort multipart upload '{upload_id}'"),
                    DisplayErrorContext(&e),
                )
            })?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for R2Client {
    async fn list_page(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage> {
        tracing::debug!(bucket, has_token = continuation_token.is_some(), "ListObjectsV2");

        let response = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|e| {
                Error::store(
                    format!("failed to list objects in bucket '{bucket}'"),
                    DisplayErrorContext(&e),
                )
            })?;

        let items = response
            .contents()
            .iter()
            .map(|object| {
                let mut info = ObjectInfo::new(object.key().unwrap_or_default(), object.size());
                if let Some(modified) = object.last_modified() {
                    info.last_modified = Timestamp::from_second(modified.secs()).ok();
                }
                info.etag = object.e_tag().map(|e| e.trim_matches('"').to_string());
                info
            })
            .collect();

        Ok(ListPage {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(str::to_string),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody> {
        tracing::debug!(bucket, key, "GetObject");

        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                Error::store(
                    format!("failed to get object '{key}' from bucket '{bucket}'"),
                    DisplayErrorContext(&e),
                )
            })?;

        let content_length = response
            .content_length()
            .and_then(|len| u64::try_from(len).ok());
        let reader = Box::pin(response.body.into_async_read());

        Ok(ObjectBody {
            content_length,
            reader: Box::new(reader),
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: BoxedReader,
        size: u64,
    ) -> Result<()> {
        let content_type = mime_guess::from_path(key).first_raw();
        let multipart = self.multipart.use_multipart(size);
        tracing::debug!(bucket, key, size, multipart, ?content_type, "PutObject");

        if multipart {
            upload_multipart(
                &self.inner,
                &self.multipart,
                bucket,
                key,
                body,
                size,
                content_type,
            )
            .await
        } else {
            self.put_single(bucket, key, body, size, content_type).await
        }
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        tracing::debug!(bucket, key, "DeleteObject");

        self.inner
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                Error::store(
                    format!("failed to delete object '{key}' from bucket '{bucket}'"),
                    DisplayErrorContext(&e),
                )
            })?;

        Ok(())
    }

    async fn copy_object(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<()> {
        let source = endpoint::copy_source(bucket, src_key);
        tracing::debug!(bucket, src_key, dst_key, %source, "CopyObject");

        self.inner
            .copy_object()
            .bucket(bucket)
            .key(dst_key)
            .copy_source(source)
            .send()
            .await
            .map_err(|e| {
                Error::store(
                    format!(
                        "failed to copy object from '{src_key}' to '{dst_key}' in bucket '{bucket}'"
                    ),
                    DisplayErrorContext(&e),
                )
            })?;

        Ok(())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl> {
        tracing::debug!(bucket, key, secs = expires_in.as_secs(), "presign GetObject");

        let context =
            format!("failed to generate presigned URL for object '{key}' in bucket '{bucket}'");

        let presigning =
            PresigningConfig::expires_in(expires_in).map_err(|e| Error::store(&context, e))?;

        let request = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| Error::store(&context, DisplayErrorContext(&e)))?;

        let expires_at = SignedDuration::try_from(expires_in)
            .ok()
            .and_then(|d| Timestamp::now().checked_add(d).ok())
            .ok_or_else(|| Error::store(&context, "expiry is out of range"))?;

        Ok(PresignedUrl {
            url: request.uri().to_string(),
            expires_at,
        })
    }
}
