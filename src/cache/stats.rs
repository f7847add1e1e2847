//! Cache Statistics Module
//!
//! Tracks cache effectiveness counters: hits, misses, expirations, evictions.

use serde::Serialize;

// == Cache Stats ==
/// Counters describing how the cache has behaved since construction.
///
/// `misses` counts every lookup that reported absence, whatever the cause;
/// `expirations` additionally counts the subset caused by an entry aging out.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups answered from storage
    pub hits: u64,
    /// Lookups that reported absence (true miss, expiry, or corrupt entry)
    pub misses: u64,
    /// Entries removed at read time because they aged out
    pub expirations: u64,
    /// Entries removed by the size-bounded sweep
    pub evictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Expiration ==
    /// Increments the expiration counter.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    // == Record Evictions ==
    /// Adds `count` entries removed by a size sweep.
    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.expirations, 0);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_hit_rate_no_lookups() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_record_evictions_accumulates() {
        let mut stats = CacheStats::new();
        stats.record_evictions(3);
        stats.record_evictions(2);
        assert_eq!(stats.evictions, 5);
    }

    #[test]
    fn test_expirations_tracked_separately() {
        let mut stats = CacheStats::new();
        stats.record_expiration();
        stats.record_miss();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 1);
    }
}
