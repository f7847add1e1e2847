//! Valluvar Cache - On-disk artifact cache for a storytelling pipeline
//!
//! Content-addressed caching of generated artifacts (verse lookups, stories,
//! image prompt sets, narration audio, video metadata) with read-time expiry
//! and size-bounded eviction. The cache fails open: internal faults degrade
//! to a miss, never to an error that blocks the caller's pipeline.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{canonical_digest, categories, Cache, CacheStats};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
