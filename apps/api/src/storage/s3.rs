use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use super::{checked_key, FileStorage, StorageError};
use crate::config::S3Config;
use crate::urls::asset_url;

/// S3 / MinIO backed storage. URLs point at `S3_PUBLIC_URL`.
#[derive(Clone)]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: String,
}

impl S3Storage {
    /// Constructs a client configured for MinIO (local) or AWS (production).
    pub async fn connect(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
            None,
            None,
            "portfolio-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        info!("S3 storage initialized (bucket: {})", config.bucket);

        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket: config.bucket.clone(),
            public_url: config.public_url.clone(),
        }
    }
}

#[async_trait]
impl FileStorage for S3Storage {
    async fn save(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        let key = checked_key(key)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("upload of {key} failed: {e}")))?;
        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Bytes, StorageError> {
        let checked = checked_key(key)?;
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&checked)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|s| s.is_no_such_key()).unwrap_or(false) {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::S3(format!("download of {checked} failed: {e}"))
                }
            })?;
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(format!("reading {checked} failed: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let key = checked_key(key)?;
        // S3 DeleteObject succeeds for missing keys.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("delete of {key} failed: {e}")))?;
        Ok(())
    }

    fn url_for(&self, key: &str) -> Option<String> {
        asset_url(None, &self.public_url, key)
    }
}
