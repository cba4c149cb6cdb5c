use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use listing_schema::{PresignedUrlRequest, PresignedUrlResponse};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create presigning config: {0}")]
    Config(String),
    #[error("failed to create presigned url: {0}")]
    Presign(String),
}

/// Hands out short-lived upload credentials for the object store. The
/// service never sees the uploaded bytes.
#[async_trait]
pub trait UploadSigner: Send + Sync + 'static {
    async fn presign_upload(
        &self,
        user_id: &str,
        request: &PresignedUrlRequest,
    ) -> Result<PresignedUrlResponse, StorageError>;
}

pub fn object_key(user_id: &str, file_id: &str) -> String {
    format!("uploads/{user_id}/{file_id}")
}

#[derive(Debug, Clone)]
pub struct S3UploadSigner {
    inner: aws_sdk_s3::Client,
    bucket: String,
    region: String,
    ttl: Duration,
}

impl S3UploadSigner {
    pub fn new(inner: aws_sdk_s3::Client, bucket: String, region: String, ttl: Duration) -> Self {
        S3UploadSigner {
            inner,
            bucket,
            region,
            ttl,
        }
    }

    /// Where the object can be read once the upload has finished.
    pub fn access_url(&self, key: &str) -> String {
        format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key)
    }
}

#[async_trait]
impl UploadSigner for S3UploadSigner {
    async fn presign_upload(
        &self,
        user_id: &str,
        request: &PresignedUrlRequest,
    ) -> Result<PresignedUrlResponse, StorageError> {
        let key = object_key(user_id, &request.file_id);
        let config = PresigningConfig::expires_in(self.ttl).map_err(|e| StorageError::Config(e.to_string()))?;
        let presigned = self
            .inner
            .put_object()
            .bucket(self.bucket.clone())
            .key(key.clone())
            .content_type(request.mime_type.clone())
            .content_length(request.size)
            .presigned(config)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        log::debug!("Presigned upload of {} for {}", key, user_id);
        Ok(PresignedUrlResponse {
            file_id: request.file_id.clone(),
            url: presigned.uri().to_string(),
            name: request.name.clone(),
            mime_type: request.mime_type.clone(),
            access_url: self.access_url(&key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_scoped_per_user() {
        assert_eq!(object_key("user-1", "abc.jpg"), "uploads/user-1/abc.jpg");
    }
}
