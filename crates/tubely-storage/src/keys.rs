//! Object key derivation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::TryRngCore;
use tubely_models::{AspectClass, ContentType, ObjectKey};

use crate::error::{StorageError, StorageResult};

/// Random bytes behind each object id.
pub const OBJECT_ID_BYTES: usize = 32;

/// 32 bytes from the OS CSPRNG, URL-safe base64 without padding (43 chars).
pub fn random_object_id() -> StorageResult<String> {
    let mut bytes = [0u8; OBJECT_ID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| StorageError::KeyDerivation(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Derive a fresh `<aspect>/<id>.<ext>` key for an object of `content_type`.
pub fn derive_key(aspect: AspectClass, content_type: &ContentType) -> StorageResult<ObjectKey> {
    let id = random_object_id()?;
    Ok(ObjectKey::compose(aspect, &id, content_type.extension()))
}
