//! Shared data models for the Tubely video ingest service.
//!
//! This crate provides Serde-serializable types for:
//! - Aspect classification of uploaded videos
//! - Content type validation per media kind
//! - Object keys and stored object coordinates
//! - Video records exchanged with the persistence layer

pub mod aspect;
pub mod error;
pub mod location;
pub mod media_type;
pub mod object_key;
pub mod video;

// Re-export common types
pub use aspect::AspectClass;
pub use error::{ValidationError, ValidationResult};
pub use location::ObjectLocation;
pub use media_type::{ContentType, MediaKind};
pub use object_key::ObjectKey;
pub use video::{CreateVideoRequest, Video, VideoId};
