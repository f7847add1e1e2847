//! Key Canonicalization Module
//!
//! Converts structured cache keys into fixed-length storage digests.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{CacheError, Result};

// == Canonical Digest ==
/// Computes the storage digest for a structured cache key.
///
/// The key is converted into a JSON tree first. `serde_json` keeps object
/// members ordered by key at every nesting level, so the rendered text is a
/// canonical serialization: two structurally equal keys produce the same
/// digest regardless of mapping insertion order. The digest is the
/// hex-encoded SHA-256 of that text, an addressing aid rather than an
/// integrity guarantee.
///
/// # Arguments
/// * `key` - Any acyclic combination of mappings, sequences, and scalars
///
/// # Errors
/// Returns `CacheError::KeySerialization` when the key cannot be represented
/// as JSON, e.g. a map with non-string keys.
pub fn canonical_digest<K: Serialize + ?Sized>(key: &K) -> Result<String> {
    let value = serde_json::to_value(key).map_err(CacheError::KeySerialization)?;
    let canonical = value.to_string();

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
