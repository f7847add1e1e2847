//! Cache Module
//!
//! Content-addressed on-disk caching with read-time expiry and size-bounded
//! eviction.

mod digest;
mod entry;
mod envelope;
mod stats;
mod store;
mod sweep;


// Re-export public types
pub use digest::canonical_digest;
pub use entry::{EntryInfo, EntryStore};
pub use envelope::{Envelope, ENVELOPE_VERSION};
pub use stats::CacheStats;
pub use store::Cache;
pub use sweep::{enforce_size_bound, is_expired, SweepOutcome, SWEEP_TARGET_RATIO};

// == Well-Known Categories ==
/// Category names used by the generation pipeline.
///
/// The store accepts any valid category and creates its partition on first
/// write; these constants are the fixed set the pipeline components use.
pub mod categories {
    /// Verse lookups
    pub const KURAL: &str = "kural";
    /// Generated bilingual stories
    pub const STORIES: &str = "stories";
    /// Generated image sets
    pub const IMAGES: &str = "images";
    /// Narration audio
    pub const AUDIO: &str = "audio";
    /// Emotional and thematic analysis
    pub const ANALYSIS: &str = "analysis";
    /// Assembled videos
    pub const VIDEOS: &str = "videos";
    /// Image prompt sets
    pub const IMAGE_PROMPTS: &str = "image_prompts";
}
