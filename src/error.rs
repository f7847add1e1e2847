//! Error types for the artifact cache
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the artifact cache.
///
/// Only the caller-contract variants (`KeySerialization`, `ValueSerialization`,
/// `InvalidCategory`) ever cross the facade boundary; `Storage` and
/// `CorruptEntry` are handled internally and degrade to a miss or a failed
/// write.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache key could not be canonicalized into a digest
    #[error("Key cannot be serialized: {0}")]
    KeySerialization(#[source] serde_json::Error),

    /// Value to be cached could not be serialized
    #[error("Value cannot be serialized: {0}")]
    ValueSerialization(#[source] serde_json::Error),

    /// Category name is not usable as a storage partition
    #[error("Invalid category name: {0:?}")]
    InvalidCategory(String),

    /// Underlying storage read/write failure
    #[error("Storage failure at {path:?}: {source}")]
    Storage {
        /// Path the operation touched
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A stored entry exists but cannot be decoded
    #[error("Corrupt cache entry {category}/{digest}: {reason}")]
    CorruptEntry {
        /// Category partition the entry lives in
        category: String,
        /// Digest the entry is addressed by
        digest: String,
        /// Why decoding failed
        reason: String,
    },
}

impl CacheError {
    /// Whether this error is a caller contract violation (propagated by the
    /// facade) rather than an internal fault (swallowed by the facade).
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            CacheError::KeySerialization(_)
                | CacheError::ValueSerialization(_)
                | CacheError::InvalidCategory(_)
        )
    }
}

// == Result Type Alias ==
/// Convenience Result type for the artifact cache.
pub type Result<T> = std::result::Result<T, CacheError>;
