//! In-memory object store.
//!
//! Presigned URLs carry an HMAC-SHA256 signature over bucket, key and
//! expiry, so fetch-with-URL behaves like a real store: tampered or expired
//! URLs are rejected.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use tubely_models::{ContentType, ObjectKey, ObjectLocation};
use url::Url;

use crate::error::{StorageError, StorageResult};
use crate::store::ObjectStore;

type HmacSha256 = Hmac<Sha256>;

/// Host suffix of URLs issued by the in-memory store.
const HOST_SUFFIX: &str = ".memory.local";

const EXPIRES_PARAM: &str = "X-Expires";
const SIGNATURE_PARAM: &str = "X-Signature";

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Object store held in process memory.
#[derive(Debug)]
pub struct InMemoryObjectStore {
    bucket: String,
    signing_key: Option<Vec<u8>>,
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    fail_uploads: AtomicBool,
}

impl InMemoryObjectStore {
    pub fn new(bucket: impl Into<String>, signing_key: impl Into<Vec<u8>>) -> Self {
        Self {
            bucket: bucket.into(),
            signing_key: Some(signing_key.into()),
            objects: RwLock::new(HashMap::new()),
            fail_uploads: AtomicBool::new(false),
        }
    }

    /// A store with no signing credentials; every presign fails.
    pub fn without_credentials(bucket: impl Into<String>) -> Self {
        Self {
            signing_key: None,
            ..Self::new(bucket, Vec::<u8>::new())
        }
    }

    /// Make subsequent uploads fail with `UploadFailed`.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch through a presigned URL, as a client would.
    pub fn fetch(&self, url: &str) -> StorageResult<StoredObject> {
        self.fetch_at(url, Utc::now())
    }

    /// Fetch through a presigned URL as of `now`.
    pub fn fetch_at(&self, url: &str, now: DateTime<Utc>) -> StorageResult<StoredObject> {
        let key_material = self.signing_key()?;
        let url = Url::parse(url).map_err(|e| StorageError::AccessDenied(format!("malformed URL: {}", e)))?;

        let bucket = url
            .host_str()
            .and_then(|h| h.strip_suffix(HOST_SUFFIX))
            .ok_or_else(|| StorageError::AccessDenied("unknown host".to_string()))?
            .to_string();
        let key = url.path().trim_start_matches('/').to_string();

        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .ok_or_else(|| StorageError::AccessDenied(format!("missing {}", name)))
        };
        let expires: i64 = param(EXPIRES_PARAM)?
            .parse()
            .map_err(|_| StorageError::AccessDenied("invalid expiry".to_string()))?;
        let signature = URL_SAFE_NO_PAD
            .decode(param(SIGNATURE_PARAM)?)
            .map_err(|_| StorageError::AccessDenied("invalid signature encoding".to_string()))?;

        let mut mac = HmacSha256::new_from_slice(key_material)
            .map_err(|e| StorageError::signing_failed(e.to_string()))?;
        mac.update(string_to_sign(&bucket, &key, expires).as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| StorageError::AccessDenied("signature mismatch".to_string()))?;

        if now.timestamp() >= expires {
            return Err(StorageError::AccessDenied("URL expired".to_string()));
        }

        self.get(&bucket, &key).ok_or_else(|| StorageError::not_found(key))
    }

    fn signing_key(&self) -> StorageResult<&[u8]> {
        self.signing_key
            .as_deref()
            .ok_or_else(|| StorageError::signing_failed("no signing credentials configured"))
    }
}

fn string_to_sign(bucket: &str, key: &str, expires: i64) -> String {
    format!("GET\n{}\n{}\n{}", bucket, key, expires)
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(&self, key: &ObjectKey, body: &Path, content_type: &ContentType) -> StorageResult<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::upload_failed("injected upload failure"));
        }

        let bytes = tokio::fs::read(body).await?;
        debug!(key = %key, size = bytes.len(), "Stored object in memory");

        self.objects.write().unwrap_or_else(|e| e.into_inner()).insert(
            (self.bucket.clone(), key.as_str().to_string()),
            StoredObject {
                bytes,
                content_type: content_type.as_str().to_string(),
            },
        );
        Ok(())
    }

    async fn presign_get(&self, location: &ObjectLocation, expires_in: Duration) -> StorageResult<String> {
        let key_material = self.signing_key()?;
        let expires_in = chrono::Duration::from_std(expires_in)
            .map_err(|e| StorageError::signing_failed(e.to_string()))?;
        let expires = (Utc::now() + expires_in).timestamp();

        let mut mac = HmacSha256::new_from_slice(key_material)
            .map_err(|e| StorageError::signing_failed(e.to_string()))?;
        mac.update(string_to_sign(&location.bucket, location.key.as_str(), expires).as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        let mut url = Url::parse(&format!(
            "https://{}{}/{}",
            location.bucket, HOST_SUFFIX, location.key
        ))
        .map_err(|e| StorageError::InvalidLocation(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair(EXPIRES_PARAM, &expires.to_string())
            .append_pair(SIGNATURE_PARAM, &signature);

        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    async fn store_with_object() -> (InMemoryObjectStore, ObjectLocation) {
        let store = InMemoryObjectStore::new("tubely-videos", b"secret".to_vec());
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"moov mdat").unwrap();

        let key = ObjectKey::from_string("landscape/abc.mp4");
        let content_type = ContentType::parse("video/mp4").unwrap();
        store.put_object(&key, file.path(), &content_type).await.unwrap();

        (store, ObjectLocation::new("tubely-videos", key))
    }

    #[tokio::test]
    async fn test_fetch_within_ttl() {
        let (store, location) = store_with_object().await;
        let url = store.presign_get(&location, Duration::from_secs(1200)).await.unwrap();

        let object = store.fetch(&url).unwrap();
        assert_eq!(object.bytes, b"moov mdat");
        assert_eq!(object.content_type, "video/mp4");
    }

    #[tokio::test]
    async fn test_fetch_after_expiry_is_denied() {
        let (store, location) = store_with_object().await;
        let url = store.presign_get(&location, Duration::from_secs(1200)).await.unwrap();

        let later = Utc::now() + chrono::Duration::minutes(21);
        assert!(matches!(store.fetch_at(&url, later), Err(StorageError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_tampered_url_is_denied() {
        let (store, location) = store_with_object().await;
        let url = store.presign_get(&location, Duration::from_secs(1200)).await.unwrap();

        let tampered = url.replace("landscape/abc.mp4", "portrait/abc.mp4");
        assert!(matches!(store.fetch(&tampered), Err(StorageError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_presign_without_credentials() {
        let store = InMemoryObjectStore::without_credentials("tubely-videos");
        let location = ObjectLocation::new("tubely-videos", ObjectKey::from_string("other/x.mp4"));

        let err = store.presign_get(&location, Duration::from_secs(60)).await.unwrap_err();
        assert!(matches!(err, StorageError::SigningFailed(_)));
    }

    #[tokio::test]
    async fn test_injected_upload_failure_stores_nothing() {
        let store = InMemoryObjectStore::new("tubely-videos", b"secret".to_vec());
        store.set_fail_uploads(true);

        let file = NamedTempFile::new().unwrap();
        let err = store
            .put_object(
                &ObjectKey::from_string("other/x.mp4"),
                file.path(),
                &ContentType::parse("video/mp4").unwrap(),
            )
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert!(store.is_empty());
    }
}
