//! Object store abstraction.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tubely_models::{ContentType, ObjectKey, ObjectLocation};

use crate::error::StorageResult;

/// Where uploaded videos are written and how they are read back.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket that `put_object` writes to.
    fn bucket(&self) -> &str;

    /// Stream the file at `body` into the bucket under `key`.
    ///
    /// Either the whole object is stored or an error is returned and the
    /// object must be treated as absent. No internal retry.
    async fn put_object(&self, key: &ObjectKey, body: &Path, content_type: &ContentType) -> StorageResult<()>;

    /// URL granting read access to `location` for `expires_in`.
    ///
    /// Touches no stored data; fails with `SigningFailed` when no
    /// credentials are available.
    async fn presign_get(&self, location: &ObjectLocation, expires_in: Duration) -> StorageResult<String>;

    /// Verify the bucket is reachable. Used by readiness checks.
    async fn check_connectivity(&self) -> StorageResult<()> {
        Ok(())
    }
}
