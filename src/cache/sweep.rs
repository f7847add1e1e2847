//! Lifecycle Sweep Module
//!
//! Enforces entry expiry and the aggregate size bound.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::cache::entry::EntryStore;
use crate::error::Result;

// == Public Constants ==
/// Fraction of the size bound the eviction sweep shrinks the store to.
///
/// Sweeping below the bound rather than exactly to it keeps a store sitting
/// at the boundary from re-triggering a full scan on every following write.
pub const SWEEP_TARGET_RATIO: f64 = 0.8;

// == Expiry ==
/// Whether an entry written at `modified_at` has outlived the expiry window.
///
/// Boundary condition: an entry exactly `expiry_days` old is still alive;
/// expiry requires the age to strictly exceed the window.
pub fn is_expired(modified_at: DateTime<Utc>, expiry_days: u32, now: DateTime<Utc>) -> bool {
    now - modified_at > Duration::days(i64::from(expiry_days))
}

// == Sweep Outcome ==
/// Result of a size-bounded eviction sweep.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepOutcome {
    /// Entries removed by the sweep
    pub evicted: usize,
    /// Bytes reclaimed
    pub bytes_freed: u64,
}

// == Size-Bounded Eviction ==
/// Evicts globally-oldest entries until the aggregate size is at or below
/// `SWEEP_TARGET_RATIO * max_bytes`.
///
/// Does nothing while the aggregate is within `max_bytes`. Candidates are
/// ordered by modification time, oldest first, with ties broken by digest so
/// repeated sweeps over identical state remove identical entries. The sweep
/// is advisory: entries removed underneath it by a concurrent writer are
/// treated as already reclaimed, and a failed delete is skipped rather than
/// aborting the sweep.
pub fn enforce_size_bound(store: &EntryStore, max_bytes: u64) -> Result<SweepOutcome> {
    let mut entries = store.list_all()?;
    let total: u64 = entries.iter().map(|e| e.size_bytes).sum();
    if total <= max_bytes {
        return Ok(SweepOutcome::default());
    }

    let target = (max_bytes as f64 * SWEEP_TARGET_RATIO) as u64;
    entries.sort_by(|a, b| {
        a.modified_at
            .cmp(&b.modified_at)
            .then_with(|| a.digest.cmp(&b.digest))
    });

    let mut outcome = SweepOutcome::default();
    let mut remaining = total;
    for entry in entries {
        if remaining <= target {
            break;
        }
        match store.delete(&entry.category, &entry.digest) {
            Ok(true) => {
                outcome.evicted += 1;
                outcome.bytes_freed += entry.size_bytes;
                debug!(
                    category = %entry.category,
                    digest = %entry.digest,
                    size_bytes = entry.size_bytes,
                    "evicted cache entry"
                );
            }
            Ok(false) => {}
            Err(e) => {
                debug!(error = %e, "eviction sweep skipped an entry");
            }
        }
        remaining = remaining.saturating_sub(entry.size_bytes);
    }

    if outcome.evicted > 0 {
        info!(
            evicted = outcome.evicted,
            bytes_freed = outcome.bytes_freed,
            "size sweep reclaimed space"
        );
    }
    Ok(outcome)
}
