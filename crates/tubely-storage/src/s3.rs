//! S3 client implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};
use tubely_models::{ContentType, ObjectKey, ObjectLocation};

use crate::error::{StorageError, StorageResult};
use crate::store::ObjectStore;

/// Configuration for the S3 client.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket uploads are written to
    pub bucket_name: String,
    /// AWS region
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, R2)
    pub endpoint_url: Option<String>,
    /// Static access key ID; the default credential chain is used when unset
    pub access_key_id: Option<String>,
    /// Static secret access key
    pub secret_access_key: Option<String>,
    /// Path-style addressing, needed by most S3-compatible stores
    pub force_path_style: bool,
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            bucket_name: std::env::var("S3_BUCKET")
                .map_err(|_| StorageError::config_error("S3_BUCKET not set"))?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            endpoint_url: std::env::var("S3_ENDPOINT_URL").ok().filter(|s| !s.is_empty()),
            access_key_id: std::env::var("S3_ACCESS_KEY_ID").ok().filter(|s| !s.is_empty()),
            secret_access_key: std::env::var("S3_SECRET_ACCESS_KEY").ok().filter(|s| !s.is_empty()),
            force_path_style: std::env::var("S3_FORCE_PATH_STYLE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }
}

/// S3 storage client.
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
}

impl S3Client {
    /// Create a new S3 client from configuration.
    pub async fn new(config: S3Config) -> StorageResult<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        match (&config.access_key_id, &config.secret_access_key) {
            (Some(id), Some(secret)) => {
                loader = loader.credentials_provider(Credentials::new(id, secret, None, None, "tubely"));
            }
            (None, None) => {}
            _ => {
                return Err(StorageError::config_error(
                    "S3_ACCESS_KEY_ID and S3_SECRET_ACCESS_KEY must be set together",
                ))
            }
        }

        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(builder.build());

        info!(bucket = %config.bucket_name, region = %config.region, "S3 client configured");

        Ok(Self {
            client,
            bucket: config.bucket_name,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = S3Config::from_env()?;
        Self::new(config).await
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(&self, key: &ObjectKey, body: &Path, content_type: &ContentType) -> StorageResult<()> {
        debug!("Uploading {} to {}", body.display(), key);

        // Streams from disk; the object is never held in memory.
        let stream = ByteStream::from_path(body)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(stream)
            .content_type(content_type.as_str())
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!(bucket = %self.bucket, key = %key, "Uploaded object");
        Ok(())
    }

    async fn presign_get(&self, location: &ObjectLocation, expires_in: Duration) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::signing_failed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(location.key.as_str())
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::signing_failed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::config_error(format!("S3 connectivity check failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_config() -> S3Config {
        S3Config {
            bucket_name: "tubely-videos".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: Some("http://localhost:9000".to_string()),
            access_key_id: Some("test-access-key".to_string()),
            secret_access_key: Some("test-secret-key".to_string()),
            force_path_style: true,
        }
    }

    #[tokio::test]
    async fn test_rejects_half_configured_credentials() {
        let config = S3Config {
            secret_access_key: None,
            ..static_config()
        };
        assert!(matches!(S3Client::new(config).await, Err(StorageError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_presign_is_offline_and_embeds_expiry() {
        let client = S3Client::new(static_config()).await.unwrap();
        let location = ObjectLocation::new("tubely-videos", ObjectKey::from_string("landscape/abc.mp4"));

        let url = client
            .presign_get(&location, Duration::from_secs(20 * 60))
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:9000/tubely-videos/landscape/abc.mp4?"));
        assert!(url.contains("X-Amz-Expires=1200"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[tokio::test]
    async fn test_presign_rejects_excessive_expiry() {
        let client = S3Client::new(static_config()).await.unwrap();
        let location = ObjectLocation::new("tubely-videos", ObjectKey::from_string("landscape/abc.mp4"));

        let err = client
            .presign_get(&location, Duration::from_secs(8 * 24 * 3600))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::SigningFailed(_)));
    }
}
