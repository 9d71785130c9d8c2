//! Object storage for uploaded videos.
//!
//! This crate provides:
//! - An object store seam with an S3 client and an in-memory store
//! - Class-partitioned object key derivation
//! - Time-limited playback URL signing

pub mod error;
pub mod keys;
pub mod memory;
pub mod s3;
pub mod signer;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use keys::{derive_key, random_object_id};
pub use memory::{InMemoryObjectStore, StoredObject};
pub use s3::{S3Client, S3Config};
pub use signer::{PlaybackUrl, PlaybackUrlSigner, PLAYBACK_URL_TTL};
pub use store::ObjectStore;
