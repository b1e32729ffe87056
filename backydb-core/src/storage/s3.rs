//! S3-backed storage: single-shot `put_object` below a size threshold,
//! multipart above it; the final object is never visible half-written
//! (spec §4.6).

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};

use super::StorageBackend;
use crate::error::BackyError;

const MULTIPART_THRESHOLD: usize = 8 * 1024 * 1024;
const PART_SIZE: usize = 8 * 1024 * 1024;

pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Storage {
    pub async fn new(bucket: impl Into<String>, region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }
        let sdk_config = loader.load().await;
        Self { client: aws_sdk_s3::Client::new(&sdk_config), bucket: bucket.into() }
    }

    async fn put_multipart(&self, name: &str, bytes: &[u8]) -> Result<(), BackyError> {
        let create = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| BackyError::StorageUnavailable(e.to_string()))?;
        let upload_id = create
            .upload_id()
            .ok_or_else(|| BackyError::StorageUnavailable("no upload id returned".into()))?
            .to_string();

        let mut parts = Vec::new();
        for (i, chunk) in bytes.chunks(PART_SIZE).enumerate() {
            let part_number = (i + 1) as i32;
            let result = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(name)
                .upload_id(&upload_id)
                .part_number(part_number)
                .body(ByteStream::from(chunk.to_vec()))
                .send()
                .await;

            let uploaded = match result {
                Ok(resp) => resp,
                Err(e) => {
                    let _ = self.abort_multipart(name, &upload_id).await;
                    return Err(BackyError::StorageUnavailable(e.to_string()));
                }
            };
            parts.push(
                CompletedPart::builder()
                    .e_tag(uploaded.e_tag().unwrap_or_default())
                    .part_number(part_number)
                    .build(),
            );
        }

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(name)
            .upload_id(&upload_id)
            .multipart_upload(CompletedMultipartUpload::builder().set_parts(Some(parts)).build())
            .send()
            .await
            .map_err(|e| BackyError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn abort_multipart(&self, name: &str, upload_id: &str) -> Result<(), BackyError> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(name)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| BackyError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<String, BackyError> {
        super::retry_policy().run(BackyError::is_transient, || self.put_once(name, bytes)).await
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, BackyError> {
        super::retry_policy().run(BackyError::is_transient, || self.get_once(name)).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, BackyError> {
        super::retry_policy().run(BackyError::is_transient, || self.list_once(prefix)).await
    }

    async fn delete(&self, name: &str) -> Result<(), BackyError> {
        super::retry_policy().run(BackyError::is_transient, || self.delete_once(name)).await
    }
}

impl S3Storage {
    async fn put_once(&self, name: &str, bytes: &[u8]) -> Result<String, BackyError> {
        if bytes.len() > MULTIPART_THRESHOLD {
            self.put_multipart(name, bytes).await?;
        } else {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(name)
                .body(ByteStream::from(bytes.to_vec()))
                .send()
                .await
                .map_err(|e| BackyError::StorageUnavailable(e.to_string()))?;
        }
        Ok(format!("s3://{}/{}", self.bucket, name))
    }

    async fn get_once(&self, name: &str) -> Result<Vec<u8>, BackyError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(|_| BackyError::StorageNotFound(name.to_string()))?;
        let bytes = resp
            .body
            .collect()
            .await
            .map_err(|e| BackyError::StorageUnavailable(e.to_string()))?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn list_once(&self, prefix: &str) -> Result<Vec<String>, BackyError> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .send()
            .await
            .map_err(|e| BackyError::StorageUnavailable(e.to_string()))?;
        Ok(resp.contents().iter().filter_map(|o| o.key().map(str::to_string)).collect())
    }

    async fn delete_once(&self, name: &str) -> Result<(), BackyError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| BackyError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }
}
