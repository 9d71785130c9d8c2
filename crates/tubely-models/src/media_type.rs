//! Content type parsing and per-kind allow-lists.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ValidationError, ValidationResult};

/// Content types accepted for video bodies.
pub const VIDEO_CONTENT_TYPES: &[&str] = &["video/mp4"];

/// Content types accepted for thumbnail bodies.
pub const THUMBNAIL_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Kind of media body an upload endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Thumbnail,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Thumbnail => "thumbnail",
        }
    }

    /// Content types this kind accepts.
    pub fn allowed_content_types(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Video => VIDEO_CONTENT_TYPES,
            MediaKind::Thumbnail => THUMBNAIL_CONTENT_TYPES,
        }
    }

    /// Parse a declared content type and check it against the allow-list.
    pub fn validate(&self, declared: Option<&str>) -> ValidationResult<ContentType> {
        let declared = declared
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingContentType)?;

        let content_type = ContentType::parse(declared)?;

        if !self.allowed_content_types().contains(&content_type.as_str()) {
            return Err(ValidationError::unsupported(content_type.as_str(), self.as_str()));
        }

        Ok(content_type)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `type/subtype` media type with parameters stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentType(String);

impl ContentType {
    /// Parse a header value such as `video/mp4; codecs="avc1"`.
    pub fn parse(raw: &str) -> ValidationResult<Self> {
        let essence = raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();

        let (kind, subtype) = essence
            .split_once('/')
            .ok_or_else(|| ValidationError::MalformedContentType(raw.to_string()))?;

        let is_token = |s: &str| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.' | '_'))
        };

        if !is_token(kind) || !is_token(subtype) {
            return Err(ValidationError::MalformedContentType(raw.to_string()));
        }

        Ok(Self(essence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after the slash, e.g. `mp4` for `video/mp4`.
    pub fn subtype(&self) -> &str {
        self.0.split_once('/').map(|(_, s)| s).unwrap_or_default()
    }

    /// File extension used for stored objects of this type.
    pub fn extension(&self) -> &str {
        self.subtype()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
