//! Cache Statistics Module
//!
//! Tracks spec cache behavior: hits, misses, evictions and invalidations.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads served from the cache
    pub hits: u64,
    /// Reads that went through to the table (absent or expired)
    pub misses: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
    /// Invalidations issued by writes and removals
    pub invalidations: u64,
    /// Fills discarded because an invalidation raced with them
    pub discarded_fills: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Counts a read served from the cache.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Counts a read that had to go to the table.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    /// Counts an entry dropped to make room.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Record Invalidation ==
    /// Counts an invalidation, whether or not the key was cached.
    pub fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }

    // == Record Discarded Fill ==
    /// Counts a read-through value refused by an invalidation fence.
    pub fn record_discarded_fill(&mut self) {
        self.discarded_fills += 1;
    }

    // == Set Total Entries ==
    /// Updates the current entry count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
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
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.invalidations, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_counters() {
        let mut stats = CacheStats::new();
        stats.record_eviction();
        stats.record_invalidation();
        stats.record_invalidation();
        stats.record_discarded_fill();
        stats.set_total_entries(42);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.invalidations, 2);
        assert_eq!(stats.discarded_fills, 1);
        assert_eq!(stats.total_entries, 42);
    }
}
