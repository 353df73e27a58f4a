//! Cache Store Module
//!
//! Map of cached specs with LRU tracking, lazy TTL expiration and
//! per-key invalidation fences that keep racing fills from resurrecting
//! stale values.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::key::EntryKey;
use crate::spec::SpecValue;

// == Cache Store ==
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<EntryKey, CacheEntry>,
    lru: LruTracker<EntryKey>,
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    ttl: Duration,
    /// Bumped by every invalidation
    generation: u64,
    /// Generation of the latest invalidation of each recently invalidated key
    fences: HashMap<EntryKey, u64>,
    /// Fills observed before this generation are refused outright
    floor: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` specs for `ttl` each.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries: max_entries.max(1),
            ttl,
            generation: 0,
            fences: HashMap::new(),
            floor: 0,
        }
    }

    // == Get ==
    /// Returns the cached spec if present and unexpired.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &EntryKey) -> Option<SpecValue> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                self.entries.remove(key);
                self.lru.remove(key);
                self.stats.set_total_entries(self.entries.len());
                self.stats.record_miss();
                return None;
            }

            let value = entry.value.clone();
            self.stats.record_hit();
            self.lru.touch(key);
            Some(value)
        } else {
            self.stats.record_miss();
            None
        }
    }

    /// Generation to hand back to [`CacheStore::fill`] after a read-through.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // == Fill ==
    /// Caches `value` for `key`, unless `key` was invalidated since
    /// `observed` was taken from [`CacheStore::generation`].
    ///
    /// Invalidations of other keys do not affect the fill. Returns whether
    /// the value was cached.
    pub fn fill(&mut self, key: EntryKey, value: SpecValue, observed: u64) -> bool {
        let fenced = self.fences.get(&key).is_some_and(|&at| at > observed);
        if observed < self.floor || fenced {
            self.stats.record_discarded_fill();
            return false;
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
            }
        }

        self.entries.insert(key.clone(), CacheEntry::new(value, self.ttl));
        self.lru.touch(&key);
        self.stats.set_total_entries(self.entries.len());
        true
    }

    // == Invalidate ==
    /// Drops any cached value for `key` and fences off in-flight fills.
    pub fn invalidate(&mut self, key: &EntryKey) {
        self.generation += 1;
        if self.fences.len() >= self.max_entries && !self.fences.contains_key(key) {
            // Forget individual fences; every fill already in flight is refused.
            self.fences.clear();
            self.floor = self.generation;
        }
        self.fences.insert(key.clone(), self.generation);
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
        }
        self.stats.record_invalidation();
        self.stats.set_total_entries(self.entries.len());
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<EntryKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.entries.remove(&key);
            self.lru.remove(&key);
        }

        self.stats.set_total_entries(self.entries.len());
        count
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn key(name: &str) -> EntryKey {
        EntryKey::new("urn:test:1", name)
    }

    fn store() -> CacheStore {
        CacheStore::new(100, Duration::from_secs(300))
    }

    #[test]
    fn test_store_new() {
        let store = store();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_fill_and_get() {
        let mut store = store();
        let generation = store.generation();

        assert!(store.fill(key("a"), SpecValue::new("a()"), generation));
        assert_eq!(store.get(&key("a")), Some(SpecValue::new("a()")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_absent_is_miss() {
        let mut store = store();
        assert_eq!(store.get(&key("nope")), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_store_invalidate() {
        let mut store = store();
        store.fill(key("a"), SpecValue::new("a()"), store.generation());

        store.invalidate(&key("a"));
        assert!(store.is_empty());
        assert_eq!(store.get(&key("a")), None);

        // Invalidating an absent key is fine
        store.invalidate(&key("a"));
        assert_eq!(store.stats().invalidations, 2);
    }

    #[test]
    fn test_store_rejects_fill_after_invalidation() {
        let mut store = store();
        let observed = store.generation();

        // A writer invalidates while a reader is still fetching
        store.invalidate(&key("a"));

        assert!(!store.fill(key("a"), SpecValue::new("stale()"), observed));
        assert_eq!(store.get(&key("a")), None);
        assert_eq!(store.stats().discarded_fills, 1);
    }

    #[test]
    fn test_store_fence_is_per_key() {
        let mut store = store();
        let observed = store.generation();

        // Writes to another key leave this read-through alone
        store.invalidate(&key("b"));
        store.invalidate(&key("c"));

        assert!(store.fill(key("a"), SpecValue::new("a()"), observed));
        assert_eq!(store.get(&key("a")), Some(SpecValue::new("a()")));
        assert_eq!(store.stats().discarded_fills, 0);
    }

    #[test]
    fn test_store_fill_after_invalidation_observed() {
        let mut store = store();
        store.invalidate(&key("a"));

        // Read-through started after the invalidation
        let observed = store.generation();
        assert!(store.fill(key("a"), SpecValue::new("fresh()"), observed));
    }

    #[test]
    fn test_store_fences_stay_bounded() {
        let mut store = CacheStore::new(2, Duration::from_secs(300));
        let observed = store.generation();
        for name in ["a", "b", "c"] {
            store.invalidate(&key(name));
        }

        assert!(store.fences.len() <= 2);
        // Fences were forgotten, so older observations are refused wholesale
        assert!(!store.fill(key("z"), SpecValue::new("z()"), observed));
        assert!(store.fill(key("z"), SpecValue::new("z()"), store.generation()));
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store = CacheStore::new(100, Duration::from_millis(100));
        store.fill(key("a"), SpecValue::new("a()"), store.generation());

        assert!(store.get(&key("a")).is_some());

        sleep(Duration::from_millis(150));

        assert!(store.get(&key("a")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_lru_eviction() {
        let mut store = CacheStore::new(3, Duration::from_secs(300));
        for name in ["a", "b", "c"] {
            store.fill(key(name), SpecValue::new(name), store.generation());
        }

        // Access 'a' to make it most recently used
        store.get(&key("a"));

        store.fill(key("d"), SpecValue::new("d"), store.generation());

        assert_eq!(store.len(), 3);
        assert!(store.get(&key("b")).is_none());
        assert!(store.get(&key("a")).is_some());
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_cleanup_expired() {
        let mut store = CacheStore::new(100, Duration::from_millis(100));
        store.fill(key("a"), SpecValue::new("a()"), store.generation());

        sleep(Duration::from_millis(150));

        let removed = store.cleanup_expired();
        assert_eq!(removed, 1);
        assert!(store.is_empty());
    }
}
