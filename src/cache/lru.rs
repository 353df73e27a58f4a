//! LRU Tracker Module
//!
//! Tracks access order of cached keys so the spec cache can stay bounded.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

// == LRU Tracker ==
/// Tracks access order for LRU eviction.
///
/// Every touch stamps the key with a fresh tick. `ticks` maps a key to its
/// latest stamp and `order` maps stamps back to keys, so the smallest stamp
/// is always the least recently used key. Touch, remove and evict are all
/// logarithmic in the number of tracked keys.
#[derive(Debug)]
pub struct LruTracker<K> {
    /// Latest stamp of every tracked key
    ticks: HashMap<K, u64>,
    /// Keys by stamp, oldest first
    order: BTreeMap<u64, K>,
    /// Next stamp to hand out
    clock: u64,
}

impl<K> Default for LruTracker<K> {
    fn default() -> Self {
        Self {
            ticks: HashMap::new(),
            order: BTreeMap::new(),
            clock: 0,
        }
    }
}

impl<K: Hash + Eq + Clone> LruTracker<K> {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as recently used.
    ///
    /// Starts tracking the key if it is new.
    pub fn touch(&mut self, key: &K) {
        let tick = self.clock;
        self.clock += 1;
        if let Some(previous) = self.ticks.insert(key.clone(), tick) {
            self.order.remove(&previous);
        }
        self.order.insert(tick, key.clone());
    }

    // == Remove ==
    /// Stops tracking a key. Unknown keys are ignored.
    pub fn remove(&mut self, key: &K) {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if the tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<K> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    // == Is Empty ==
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru: LruTracker<String> = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
    }

    #[test]
    fn test_lru_touch_same_key_multiple_times() {
        let mut lru = LruTracker::new();

        lru.touch(&"key1");
        lru.touch(&"key1");
        lru.touch(&"key1");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.evict_oldest(), Some("key1"));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_touch_moves_to_front() {
        let mut lru = LruTracker::new();

        lru.touch(&"a");
        lru.touch(&"b");
        lru.touch(&"c");

        // Touch 'a' to make it the most recent
        lru.touch(&"a");

        assert_eq!(lru.evict_oldest(), Some("b"));
        assert_eq!(lru.evict_oldest(), Some("c"));
        assert_eq!(lru.evict_oldest(), Some("a"));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = LruTracker::new();
        lru.touch(&1);
        lru.touch(&2);

        lru.remove(&1);
        lru.remove(&42);
        assert_eq!(lru.len(), 1);
        assert_eq!(lru.evict_oldest(), Some(2));
    }

    #[test]
    fn test_lru_large_working_set() {
        let mut lru = LruTracker::new();
        for key in 0..10_000u32 {
            lru.touch(&key);
        }
        // Re-touch every even key so the odd ones become the oldest
        for key in (0..10_000u32).step_by(2) {
            lru.touch(&key);
        }

        assert_eq!(lru.len(), 10_000);
        assert_eq!(lru.evict_oldest(), Some(1));
        assert_eq!(lru.evict_oldest(), Some(3));
        lru.remove(&5);
        assert_eq!(lru.evict_oldest(), Some(7));
        assert_eq!(lru.len(), 9_996);
    }
}
