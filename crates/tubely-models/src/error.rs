//! Validation error types.

use thiserror::Error;

/// Result type for model validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors raised when client-supplied values fail validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing content type")]
    MissingContentType,

    #[error("Malformed content type: {0}")]
    MalformedContentType(String),

    #[error("Unsupported content type '{content_type}' for {kind} uploads")]
    UnsupportedContentType { content_type: String, kind: String },

    #[error("Unknown aspect class: {0}")]
    UnknownAspectClass(String),

    #[error("Malformed object location: {0}")]
    MalformedLocation(String),

    #[error("Invalid video ID: {0}")]
    InvalidVideoId(String),
}

impl ValidationError {
    pub fn unsupported(content_type: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnsupportedContentType {
            content_type: content_type.into(),
            kind: kind.into(),
        }
    }
}
