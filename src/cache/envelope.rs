//! Value Envelope Module
//!
//! Versioned JSON wrapper persisted for every cache entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Public Constants ==
/// Current envelope format version.
pub const ENVELOPE_VERSION: u32 = 1;

// == Envelope ==
/// On-disk representation of a cached value.
///
/// Values are stored as self-describing JSON with an explicit format version,
/// so entries stay inspectable with ordinary tools and a format change never
/// silently misreads old files. An envelope whose version does not match
/// [`ENVELOPE_VERSION`] is treated as corrupt by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Envelope format version
    pub version: u32,
    /// Wall-clock time the value was wrapped
    pub created_at: DateTime<Utc>,
    /// The cached value itself
    pub payload: Value,
}

impl Envelope {
    // == Constructor ==
    /// Wraps a payload in the current envelope version, stamped now.
    pub fn new(payload: Value) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            created_at: Utc::now(),
            payload,
        }
    }

    // == Version Check ==
    /// Whether this envelope was written in the current format version.
    pub fn is_current(&self) -> bool {
        self.version == ENVELOPE_VERSION
    }
}
