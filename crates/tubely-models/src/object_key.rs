//! Class-partitioned object keys.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::aspect::AspectClass;

/// Length of the random identifier: 32 bytes, URL-safe base64 without padding.
pub const OBJECT_ID_LEN: usize = 43;

/// Storage key of an uploaded video: `<aspect>/<id>.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Compose a key from its parts. The id and extension are taken as given.
    pub fn compose(aspect: AspectClass, id: &str, extension: &str) -> Self {
        Self(format!("{}/{}.{}", aspect, id, extension))
    }

    /// Wrap a key read back from storage coordinates.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The aspect class prefix, if the key carries a known one.
    pub fn aspect_class(&self) -> Option<AspectClass> {
        self.0.split_once('/').and_then(|(prefix, _)| prefix.parse().ok())
    }

    /// Whether the key has the canonical `<aspect>/<43-char id>.<ext>` shape.
    pub fn is_canonical(&self) -> bool {
        let Some((prefix, file)) = self.0.split_once('/') else {
            return false;
        };
        if prefix.parse::<AspectClass>().is_err() {
            return false;
        }
        let Some((id, extension)) = file.split_once('.') else {
            return false;
        };

        id.len() == OBJECT_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            && !extension.is_empty()
            && extension
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
