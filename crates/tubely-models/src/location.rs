//! Stored object coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ValidationError, ValidationResult};
use crate::object_key::ObjectKey;

/// Bucket and key of a stored object.
///
/// Persisted on the video record as `"<bucket>,<key>"` and resolved to a
/// playback URL on every read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: ObjectKey,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: ObjectKey) -> Self {
        Self {
            bucket: bucket.into(),
            key,
        }
    }

    /// Encode for the video record.
    pub fn to_stored(&self) -> String {
        format!("{},{}", self.bucket, self.key)
    }

    /// Decode a value written by [`ObjectLocation::to_stored`].
    pub fn parse_stored(stored: &str) -> ValidationResult<Self> {
        let (bucket, key) = stored
            .split_once(',')
            .ok_or_else(|| ValidationError::MalformedLocation(stored.to_string()))?;

        let bucket = bucket.trim();
        let key = key.trim();
        if bucket.is_empty() || key.is_empty() {
            return Err(ValidationError::MalformedLocation(stored.to_string()));
        }

        Ok(Self::new(bucket, ObjectKey::from_string(key)))
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}
