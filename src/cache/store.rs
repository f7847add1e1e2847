//! Cache Facade Module
//!
//! Public get/set/invalidate/clear surface combining key canonicalization,
//! the on-disk entry store, and lifecycle enforcement.

use std::fs;
use std::sync::Mutex;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::digest::canonical_digest;
use crate::cache::entry::EntryStore;
use crate::cache::envelope::Envelope;
use crate::cache::stats::CacheStats;
use crate::cache::sweep::{enforce_size_bound, is_expired};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Cache ==
/// Content-addressed artifact cache over a directory tree.
///
/// One instance owns one cache directory; callers that need isolated storage
/// (tests in particular) construct separate instances over separate
/// directories. The cache fails open: internal storage faults degrade to a
/// miss or an unpersisted write, and only caller contract violations (an
/// unserializable key or value, an unusable category name) surface as errors.
///
/// All operations take `&self`, so one instance can be shared behind an
/// `Arc` by concurrent callers. Writers racing on the same key leave the
/// last writer's payload and timestamp in place; the entry store's atomic
/// writes keep readers from ever observing a torn entry.
#[derive(Debug)]
pub struct Cache {
    config: CacheConfig,
    store: EntryStore,
    stats: Mutex<CacheStats>,
}

impl Cache {
    // == Constructor ==
    /// Creates a cache over `config.cache_dir`.
    ///
    /// The root directory is created eagerly when caching is enabled;
    /// category partitions appear lazily on first write.
    pub fn new(config: CacheConfig) -> Result<Self> {
        if config.enable_caching {
            fs::create_dir_all(&config.cache_dir).map_err(|source| CacheError::Storage {
                path: config.cache_dir.clone(),
                source,
            })?;
        }
        let store = EntryStore::new(config.cache_dir.clone());
        Ok(Self {
            config,
            store,
            stats: Mutex::new(CacheStats::new()),
        })
    }

    /// Creates a cache from environment-derived configuration.
    pub fn from_env() -> Result<Self> {
        Self::new(CacheConfig::from_env())
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Get ==
    /// Looks up a previously stored value.
    ///
    /// Reports `Ok(None)` for an absent entry, an expired entry (deleted as
    /// a side effect of the read), an undecodable entry (also deleted), and
    /// for every lookup while caching is disabled. The caller cannot tell
    /// these cases apart from the return value; the distinction is logged.
    ///
    /// # Errors
    /// Only caller contract violations: an invalid category name or a key
    /// that cannot be canonicalized.
    pub fn get<K, V>(&self, category: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + ?Sized,
        V: DeserializeOwned,
    {
        validate_category(category)?;
        let digest = canonical_digest(key)?;
        if !self.config.enable_caching {
            return Ok(None);
        }

        let info = match self.store.entry_info(category, &digest) {
            Ok(Some(info)) => info,
            Ok(None) => {
                self.record(|s| s.record_miss());
                return Ok(None);
            }
            Err(e) => {
                warn!(category, %digest, error = %e, "cache lookup failed, treating as miss");
                self.record(|s| s.record_miss());
                return Ok(None);
            }
        };

        if is_expired(info.modified_at, self.config.cache_expiry_days, Utc::now()) {
            if let Err(e) = self.store.delete(category, &digest) {
                debug!(category, %digest, error = %e, "failed to remove expired entry");
            }
            debug!(category, %digest, "cache entry expired");
            self.record(|s| {
                s.record_expiration();
                s.record_miss();
            });
            return Ok(None);
        }

        let envelope = match self.store.read(category, &digest) {
            Ok(Some(envelope)) => envelope,
            Ok(None) => {
                // Raced with an invalidation or eviction between stat and read
                self.record(|s| s.record_miss());
                return Ok(None);
            }
            Err(e @ CacheError::CorruptEntry { .. }) => {
                warn!(category, %digest, error = %e, "removing corrupt cache entry");
                if let Err(e) = self.store.delete(category, &digest) {
                    debug!(category, %digest, error = %e, "failed to remove corrupt entry");
                }
                self.record(|s| s.record_miss());
                return Ok(None);
            }
            Err(e) => {
                warn!(category, %digest, error = %e, "cache read failed, treating as miss");
                self.record(|s| s.record_miss());
                return Ok(None);
            }
        };

        match serde_json::from_value(envelope.payload) {
            Ok(value) => {
                debug!(category, %digest, "cache hit");
                self.record(|s| s.record_hit());
                Ok(Some(value))
            }
            Err(e) => {
                // Stored payload does not match the requested shape
                warn!(category, %digest, error = %e, "removing cache entry with mismatched payload");
                if let Err(e) = self.store.delete(category, &digest) {
                    debug!(category, %digest, error = %e, "failed to remove mismatched entry");
                }
                self.record(|s| s.record_miss());
                Ok(None)
            }
        }
    }

    // == Set ==
    /// Stores a value, returning whether it was persisted.
    ///
    /// Runs the size-bounded eviction sweep first, then writes the entry
    /// atomically, refreshing its timestamp if it already existed. Storage
    /// failures are logged and reported as `Ok(false)` rather than raised;
    /// with caching disabled the call is a no-op reporting `Ok(false)`.
    ///
    /// # Errors
    /// Only caller contract violations: an invalid category name, or a key
    /// or value that cannot be serialized.
    pub fn set<K, V>(&self, category: &str, key: &K, value: &V) -> Result<bool>
    where
        K: Serialize + ?Sized,
        V: Serialize + ?Sized,
    {
        validate_category(category)?;
        let digest = canonical_digest(key)?;
        let payload = serde_json::to_value(value).map_err(CacheError::ValueSerialization)?;
        if !self.config.enable_caching {
            return Ok(false);
        }

        match enforce_size_bound(&self.store, self.config.max_cache_size_bytes()) {
            Ok(outcome) if outcome.evicted > 0 => {
                self.record(|s| s.record_evictions(outcome.evicted));
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "size sweep failed, continuing with write");
            }
        }

        match self.store.write(category, &digest, &Envelope::new(payload)) {
            Ok(()) => {
                debug!(category, %digest, "cache entry written");
                Ok(true)
            }
            Err(e) => {
                warn!(category, %digest, error = %e, "cache write failed, value not cached");
                Ok(false)
            }
        }
    }

    // == Invalidate ==
    /// Removes the entry for one key, reporting whether one existed.
    ///
    /// # Errors
    /// Only caller contract violations, as for [`Cache::get`].
    pub fn invalidate<K>(&self, category: &str, key: &K) -> Result<bool>
    where
        K: Serialize + ?Sized,
    {
        validate_category(category)?;
        let digest = canonical_digest(key)?;
        if !self.config.enable_caching {
            return Ok(false);
        }

        match self.store.delete(category, &digest) {
            Ok(removed) => {
                if removed {
                    debug!(category, %digest, "cache entry invalidated");
                }
                Ok(removed)
            }
            Err(e) => {
                warn!(category, %digest, error = %e, "invalidation failed");
                Ok(false)
            }
        }
    }

    // == Clear ==
    /// Removes every entry in `category`, or in all categories on disk when
    /// `None`. Returns whether the clear completed without a storage fault.
    ///
    /// # Errors
    /// Only an invalid category name.
    pub fn clear(&self, category: Option<&str>) -> Result<bool> {
        if let Some(category) = category {
            validate_category(category)?;
        }
        if !self.config.enable_caching {
            return Ok(false);
        }

        let targets = match category {
            Some(one) => vec![one.to_string()],
            None => match self.store.categories() {
                Ok(all) => all,
                Err(e) => {
                    warn!(error = %e, "failed to enumerate categories for clear");
                    return Ok(false);
                }
            },
        };

        let mut removed = 0;
        for target in &targets {
            match self.store.clear_category(target) {
                Ok(count) => removed += count,
                Err(e) => {
                    warn!(category = %target, error = %e, "failed to clear category");
                    return Ok(false);
                }
            }
        }
        debug!(entries = removed, "cache cleared");
        Ok(true)
    }

    // == Observability ==
    /// Snapshot of the effectiveness counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Aggregate size of every stored entry in bytes.
    pub fn total_size_bytes(&self) -> u64 {
        self.store
            .list_all()
            .map(|entries| entries.iter().map(|e| e.size_bytes).sum())
            .unwrap_or(0)
    }

    /// Number of entries across all categories.
    pub fn entry_count(&self) -> usize {
        self.store.list_all().map(|entries| entries.len()).unwrap_or(0)
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut guard) = self.stats.lock() {
            update(&mut guard);
        }
    }
}

// == Category Validation ==
/// Category names become directory names, so only plain path-segment-safe
/// names are accepted.
fn validate_category(category: &str) -> Result<()> {
    let usable = !category.is_empty()
        && category
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if usable {
        Ok(())
    } else {
        Err(CacheError::InvalidCategory(category.to_string()))
    }
}
