//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults. The cache never writes this configuration back; it is read-only
/// input supplied by the embedding application.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Whether caching is enabled at all. When false, every get is a miss
    /// and every set is a no-op.
    pub enable_caching: bool,
    /// Root directory holding one subdirectory per category
    pub cache_dir: PathBuf,
    /// Aggregate size bound across all categories, in megabytes
    pub max_cache_size_mb: u64,
    /// Age after which an entry is treated as gone, in days
    pub cache_expiry_days: u32,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `VALLUVAR_ENABLE_CACHING` - Enable the cache (default: true)
    /// - `VALLUVAR_CACHE_DIR` - Cache root directory (default: per-user cache location)
    /// - `VALLUVAR_MAX_CACHE_SIZE_MB` - Aggregate size bound in MB (default: 1000)
    /// - `VALLUVAR_CACHE_EXPIRY_DAYS` - Entry expiry in days (default: 30)
    pub fn from_env() -> Self {
        Self {
            enable_caching: env::var("VALLUVAR_ENABLE_CACHING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            cache_dir: env::var("VALLUVAR_CACHE_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or_else(default_cache_dir),
            max_cache_size_mb: env::var("VALLUVAR_MAX_CACHE_SIZE_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            cache_expiry_days: env::var("VALLUVAR_CACHE_EXPIRY_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }

    /// Creates a config rooted at the given directory, keeping the other
    /// defaults. Handy for tests that isolate storage per case.
    pub fn rooted_at(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    /// Aggregate size bound in bytes.
    pub fn max_cache_size_bytes(&self) -> u64 {
        self.max_cache_size_mb * 1024 * 1024
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enable_caching: true,
            cache_dir: default_cache_dir(),
            max_cache_size_mb: 1000,
            cache_expiry_days: 30,
        }
    }
}

/// Per-user application cache location, e.g. `~/.cache/valluvarai` on Linux.
fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("valluvarai")
}
