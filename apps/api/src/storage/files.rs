use async_trait::async_trait;
use aws_sdk_s3::{error::DisplayErrorContext, primitives::ByteStream};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::StorageError;

/// Location of an uploaded object, as handed back by the file service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub path: String,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores `data` under a fresh path derived from `name`.
    async fn upload(
        &self,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StoredFile, StorageError>;

    async fn read(&self, path: &str) -> Result<Bytes, StorageError>;
}

/// S3-compatible object storage (MinIO locally, AWS in production).
#[derive(Clone)]
pub struct S3FileStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3FileStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn upload(
        &self,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StoredFile, StorageError> {
        let key = object_key(Uuid::new_v4(), name);
        let size = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::S3(DisplayErrorContext(&e).to_string()))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        Ok(StoredFile { path: key })
    }

    async fn read(&self, path: &str) -> Result<Bytes, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_no_such_key()) == Some(true) {
                    StorageError::NotFound(path.to_string())
                } else {
                    StorageError::S3(DisplayErrorContext(&e).to_string())
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(format!("failed to read body of '{path}': {e}")))?;
        Ok(data.into_bytes())
    }
}

/// `uploads/<upload id>/<sanitized file name>`
pub fn object_key(upload_id: Uuid, name: &str) -> String {
    format!("uploads/{}/{}", upload_id, sanitize_file_name(name))
}

fn sanitize_file_name(name: &str) -> String {
    // Browsers may send a full client-side path.
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}
