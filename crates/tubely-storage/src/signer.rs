//! Playback URL signing.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use tubely_models::ObjectLocation;

use crate::error::{StorageError, StorageResult};
use crate::store::ObjectStore;

/// How long a playback URL stays valid.
pub const PLAYBACK_URL_TTL: Duration = Duration::from_secs(20 * 60);

/// A time-limited URL granting read access to one stored object.
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Turns stored object coordinates into playback URLs.
#[derive(Clone)]
pub struct PlaybackUrlSigner {
    store: Arc<dyn ObjectStore>,
    ttl: Duration,
}

impl PlaybackUrlSigner {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            ttl: PLAYBACK_URL_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign `location` with the configured TTL.
    pub async fn sign(&self, location: &ObjectLocation) -> StorageResult<PlaybackUrl> {
        self.sign_with_ttl(location, self.ttl).await
    }

    pub async fn sign_with_ttl(&self, location: &ObjectLocation, ttl: Duration) -> StorageResult<PlaybackUrl> {
        let issued_at = Utc::now();
        let url = self.store.presign_get(location, ttl).await?;

        let expires_at = chrono::Duration::from_std(ttl)
            .map(|d| issued_at + d)
            .map_err(|e| StorageError::signing_failed(e.to_string()))?;

        debug!(location = %location, ttl_secs = ttl.as_secs(), "Signed playback URL");

        Ok(PlaybackUrl {
            url,
            expires_at,
        })
    }

    /// Resolve a stored `"<bucket>,<key>"` value to a playback URL.
    pub async fn resolve_stored(&self, stored: &str) -> StorageResult<PlaybackUrl> {
        let location = ObjectLocation::parse_stored(stored)
            .map_err(|e| StorageError::InvalidLocation(e.to_string()))?;
        self.sign(&location).await
    }
}
