//! Cache Module
//!
//! In-process cache of specs with TTL expiration, LRU eviction and
//! write-through invalidation.

mod entry;
mod lru;
mod spec_cache;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use spec_cache::{SpecCache, DEFAULT_SPEC_TTL};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Default maximum number of cached specs per table
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;
