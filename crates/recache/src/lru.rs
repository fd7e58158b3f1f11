//! LRU (Least Recently Used) cache implementation
//!
//! The recency list owns every `(key, value)` pair. The index only holds
//! handles into the list, and every path that removes a list entry removes
//! its key from the index in the same call.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;

use ahash::RandomState;
use recency::{Error, Handle, RecencyList, Result};
use tracing::{debug, trace};

use crate::stats::CacheStats;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// LRU cache with fixed capacity
pub struct LruCache<K, V> {
    list: RecencyList<(K, V)>,
    index: HashMap<K, Handle, RandomState>,
    capacity: NonZeroUsize,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache with the given capacity
    ///
    /// # Errors
    /// `Error::InvalidCapacity` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        match NonZeroUsize::new(capacity) {
            Some(capacity) => Ok(Self::with_capacity(capacity)),
            None => {
                debug!("rejecting cache with zero capacity");
                Err(Error::InvalidCapacity(capacity))
            }
        }
    }

    /// Create a new LRU cache from a capacity that is known to be positive
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            list: RecencyList::with_capacity(capacity.get()),
            index: HashMap::with_capacity_and_hasher(capacity.get(), RandomState::new()),
            capacity,
            stats: CacheStats::new(),
        }
    }

    /// Get a value and mark it most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.touch(key)?;
        Some(&self.list[handle].1)
    }

    /// Get a mutable value and mark it most recently used
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.touch(key)?;
        Some(&mut self.list[handle].1)
    }

    /// Insert or overwrite a key, making it the most recently used entry
    ///
    /// Returns the evicted pair when a new key had to displace the least
    /// recently used one. Overwriting an existing key never evicts.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&handle) = self.index.get(&key) {
            // Update existing
            self.list[handle].1 = value;
            self.list.move_to_end(handle);
            self.stats.record_update();
            return None;
        }

        let evicted = if self.list.len() >= self.capacity.get() {
            self.evict()
        } else {
            None
        };

        let handle = self.list.add_to_tail((key.clone(), value));
        self.index.insert(key, handle);
        self.stats.record_insert();

        evicted
    }

    /// Get a value without touching its recency
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.index.get(key)?;
        self.list.get(handle).map(|(_, value)| value)
    }

    /// Check if a key is cached without touching its recency
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Remove a key from the cache
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.remove(key)?;
        let (_, value) = self.list.delete(handle);
        Some(value)
    }

    /// Remove and return the least recently used entry
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let (key, value) = self.list.remove_from_head()?;
        self.index.remove(&key);
        Some((key, value))
    }

    /// Drop every entry and reset statistics
    pub fn clear(&mut self) {
        debug!(len = self.list.len(), "clearing cache");
        self.list.clear();
        self.index.clear();
        self.stats.reset();
    }

    /// Verify that the index and the recency list agree
    ///
    /// Every indexed key must name a list entry carrying that same key, the
    /// two sizes must match, and the list must not exceed capacity.
    pub fn check_invariants(&self) -> Result<()> {
        self.list.check_invariants()?;

        if self.index.len() != self.list.len() {
            return Err(Error::Corrupted(format!(
                "index holds {} keys, list holds {} entries",
                self.index.len(),
                self.list.len()
            )));
        }
        if self.list.len() > self.capacity.get() {
            return Err(Error::Corrupted(format!(
                "{} entries exceed capacity {}",
                self.list.len(),
                self.capacity
            )));
        }
        for (key, &handle) in &self.index {
            match self.list.get(handle) {
                Some((stored, _)) if stored == key => {}
                Some(_) => {
                    return Err(Error::Corrupted(
                        "index handle points at an entry for another key".to_string(),
                    ))
                }
                None => return Err(Error::Corrupted("index holds a stale handle".to_string())),
            }
        }

        Ok(())
    }

    fn touch<Q>(&mut self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(key) {
            Some(&handle) => {
                self.stats.record_hit();
                self.list.move_to_end(handle);
                Some(handle)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    fn evict(&mut self) -> Option<(K, V)> {
        let (key, value) = self.list.remove_from_head()?;
        self.index.remove(&key);
        self.stats.record_eviction();
        trace!(capacity = self.capacity.get(), "evicted least recently used entry");
        Some((key, value))
    }
}

impl<K, V> LruCache<K, V> {
    /// Get the current number of entries
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Maximum number of entries held before eviction
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Hit/miss/eviction counters
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// The entry that the next eviction would drop
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        let handle = self.list.head()?;
        self.list.get(handle).map(|(key, value)| (key, value))
    }

    /// Iterate entries from least to most recently used, without touching recency
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> + ExactSizeIterator + '_ {
        self.list.iter().map(|(key, value)| (key, value))
    }

    /// Iterate keys from least to most recently used
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.list.iter().map(|(key, _)| key)
    }
}

impl<K, V> Default for LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cache: [")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "] ({}/{})", self.len(), self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<K: Clone, V>(cache: &LruCache<K, V>) -> Vec<K> {
        cache.keys().cloned().collect()
    }

    #[test]
    fn test_lru_basic() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");

        assert_eq!(cache.get(&1), Some(&"a"));
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_zero_capacity() {
        let result = LruCache::<u32, u32>::new(0);
        assert_eq!(result.err(), Some(Error::InvalidCapacity(0)));
    }

    #[test]
    fn test_lru_default_capacity() {
        let cache: LruCache<String, u32> = LruCache::default();
        assert_eq!(cache.capacity(), 10);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = LruCache::new(2).unwrap();

        assert_eq!(cache.set(1, "a"), None);
        assert_eq!(cache.set(2, "b"), None);
        assert_eq!(cache.set(3, "c"), Some((1, "a")));

        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.get(&3), Some(&"c"));
        assert_eq!(cache.stats().evictions(), 1);
    }

    #[test]
    fn test_lru_get_refreshes_recency() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.get("a"), Some(&1)); // a is now most recent
        assert_eq!(cache.set("c", 3), Some(("b", 2)));

        assert_eq!(keys(&cache), vec!["a", "c"]);
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_lru_capacity_one() {
        let mut cache = LruCache::new(1).unwrap();

        cache.set('a', 1);
        assert_eq!(cache.set('b', 2), Some(('a', 1)));

        assert_eq!(cache.get(&'a'), None);
        assert_eq!(cache.get(&'b'), Some(&2));
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn test_lru_overwrite() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        assert_eq!(cache.set(1, "z"), None); // Overwrite, full cache

        assert_eq!(cache.len(), 2);
        assert_eq!(keys(&cache), vec![2, 1]);
        assert_eq!(cache.get(&1), Some(&"z"));
        assert_eq!(cache.stats().evictions(), 0);
        assert_eq!(cache.stats().updates(), 1);
    }

    #[test]
    fn test_lru_get_mut() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set(1, vec![1]);
        cache.set(2, vec![2]);
        if let Some(v) = cache.get_mut(&1) {
            v.push(10);
        }

        assert_eq!(cache.peek(&1), Some(&vec![1, 10]));
        assert_eq!(keys(&cache), vec![2, 1]);
    }

    #[test]
    fn test_lru_peek_keeps_order() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        assert_eq!(cache.peek(&1), Some(&"a"));
        assert!(cache.contains(&1));
        cache.set(3, "c");

        assert!(!cache.contains(&1));
        assert_eq!(cache.stats().hits(), 0);
    }

    #[test]
    fn test_lru_remove() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        cache.set(3, "c");

        assert_eq!(cache.remove(&2), Some("b"));
        assert_eq!(cache.remove(&2), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&2), None);
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn test_lru_pop_and_peek_lru() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        cache.get(&1);

        assert_eq!(cache.peek_lru(), Some((&2, &"b")));
        assert_eq!(cache.pop_lru(), Some((2, "b")));
        assert_eq!(cache.pop_lru(), Some((1, "a")));
        assert_eq!(cache.pop_lru(), None);
        assert_eq!(cache.peek_lru(), None);
        assert_eq!(cache.stats().evictions(), 0);
    }

    #[test]
    fn test_lru_clear() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        cache.get(&1);
        cache.clear();

        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits(), 0);
        assert!(cache.check_invariants().is_ok());

        cache.set(3, "c");
        assert_eq!(cache.get(&3), Some(&"c"));
    }

    #[test]
    fn test_lru_borrowed_keys() {
        let mut cache: LruCache<String, u32> = LruCache::new(2).unwrap();

        cache.set("alpha".to_string(), 1);
        assert_eq!(cache.get("alpha"), Some(&1));
        assert_eq!(cache.remove("alpha"), Some(1));
    }

    #[test]
    fn test_lru_hit_miss_stats() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set(1, "a");
        cache.get(&1);
        cache.get(&1);
        cache.get(&9);

        assert_eq!(cache.stats().hits(), 2);
        assert_eq!(cache.stats().misses(), 1);
        assert_eq!(cache.stats().inserts(), 1);
    }

    #[test]
    fn test_lru_display() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set("item1", "a");
        cache.set("item2", "b");
        cache.set("item2", "c");

        assert_eq!(cache.to_string(), "cache: [item1: a, item2: c] (2/3)");
        assert_eq!(format!("{:?}", cache), r#"{"item1": "a", "item2": "c"}"#);
    }
}
