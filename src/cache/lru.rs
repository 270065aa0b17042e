//! LRU Cache Module
//!
//! Implements a persistent Least Recently Used cache.
//!
//! The cache is a value: every operation that changes it returns a new
//! `LruCache` and leaves the receiver untouched, so any handle obtained
//! earlier stays a valid snapshot. Internally two persistent maps mirror
//! each other:
//! - `entries`: key -> (value, recency index)
//! - `order`: recency index -> key, smallest index = least recently used
//!
//! A [`RecencyClock`] hands out a fresh, strictly larger index on every
//! touch, so no two entries ever share an index.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::cache::clock::RecencyClock;
use crate::cache::entry::CacheEntry;
use crate::cache::iter::Iter;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::map::{KeyedEntryMap, OrderedIndexMap};

// == LRU Cache ==
/// Immutable, bounded key-value cache with LRU eviction.
///
/// Cloning is O(1) and shares all structure. Lookups, inserts and removals
/// cost O(log n) and copy only the touched paths of the underlying maps.
///
/// # Example
/// ```
/// use persistent_lru::LruCache;
///
/// let cache = LruCache::new(2).add("a", 1).add("b", 2);
/// let (hit, cache) = cache.try_find("a");
/// assert_eq!(hit, Some(1));
///
/// // "b" is now the least recently used entry and makes room for "c"
/// let cache = cache.add("c", 3);
/// assert!(cache.contains_key("a"));
/// assert!(!cache.contains_key("b"));
/// ```
pub struct LruCache<K, V> {
    /// Key -> value and recency index
    entries: KeyedEntryMap<K, CacheEntry<V>>,
    /// Recency index -> key, ascending = LRU to MRU
    order: OrderedIndexMap<K>,
    /// Maximum number of entries retained
    capacity: usize,
    /// Next recency index to hand out
    clock: RecencyClock,
}

impl<K, V> LruCache<K, V> {
    // == Constructor ==
    /// The canonical empty cache: capacity zero, clock at zero. Allocates
    /// nothing, so every call yields the same value.
    pub const fn empty() -> Self {
        Self {
            entries: KeyedEntryMap::new(),
            order: OrderedIndexMap::new(),
            capacity: 0,
            clock: RecencyClock::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The recency index the next touch will receive.
    pub fn next_index(&self) -> u64 {
        self.clock.current()
    }

    /// Returns true when both values share all their structure, as after a
    /// clone, a miss, or any other operation that changes nothing.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.capacity == other.capacity
            && self.clock == other.clock
            && self.entries.ptr_eq(&other.entries)
            && self.order.ptr_eq(&other.order)
    }
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    // == Contains Key ==
    /// Membership test. Does not count as a use.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    // == Peek ==
    /// Reads a value without promoting it.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Recency index `key` was last touched at.
    pub fn recency_of<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|entry| entry.recency_index)
    }

    /// The least recently used entry: the next eviction candidate.
    pub fn lru(&self) -> Option<(&K, &V)> {
        let (_, key) = self.order.first()?;
        self.entries.get(key).map(|entry| (key, &entry.value))
    }

    /// The most recently used entry.
    pub fn mru(&self) -> Option<(&K, &V)> {
        let (_, key) = self.order.last()?;
        self.entries.get(key).map(|entry| (key, &entry.value))
    }

    // == Iteration ==
    /// Entries from least to most recently used. Use `.rev()` for MRU first.
    ///
    /// Iterating is a pure read and promotes nothing.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.order.iter(), &self.entries)
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    // == Check Invariants ==
    /// Verifies that the entry and order maps mirror each other, that the
    /// size bound holds and that every index is below the clock.
    pub fn check_invariants(&self) -> Result<()> {
        if self.entries.len() != self.order.len() {
            return Err(CacheError::Inconsistent(format!(
                "entries hold {} keys but order holds {}",
                self.entries.len(),
                self.order.len()
            )));
        }

        if self.len() > self.capacity {
            return Err(CacheError::Inconsistent(format!(
                "{} entries exceed capacity {}",
                self.len(),
                self.capacity
            )));
        }

        for (index, key) in self.order.iter() {
            if *index >= self.clock.current() {
                return Err(CacheError::Inconsistent(format!(
                    "index {} is not below the clock ({})",
                    index,
                    self.clock.current()
                )));
            }
            match self.entries.get(key) {
                Some(entry) if entry.recency_index == *index => {}
                Some(entry) => {
                    return Err(CacheError::Inconsistent(format!(
                        "order index {} maps to an entry stamped {}",
                        index, entry.recency_index
                    )));
                }
                None => {
                    return Err(CacheError::Inconsistent(format!(
                        "order index {} maps to a missing key",
                        index
                    )));
                }
            }
        }

        for (key, entry) in self.entries.iter() {
            if self.order.get(entry.recency_index) != Some(key) {
                return Err(CacheError::Inconsistent(format!(
                    "entry stamped {} has no matching order slot",
                    entry.recency_index
                )));
            }
        }

        Ok(())
    }
}

impl<K: Hash + Eq + Clone, V: Clone> LruCache<K, V> {
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self::empty().change_capacity(capacity)
    }

    /// Creates an empty cache sized by `config`.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity)
    }

    // == Try Find ==
    /// Looks up `key`, promoting it to most recently used on a hit.
    ///
    /// A miss returns the receiver unchanged: no index is consumed.
    pub fn try_find<Q>(&self, key: &Q) -> (Option<V>, Self)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.extract(key) {
            Some((key, entry, rest)) => {
                trace!(index = entry.recency_index, "promoting cache entry");
                let promoted = rest.place(key, entry.value.clone());
                (Some(entry.value), promoted)
            }
            None => (None, self.clone()),
        }
    }

    // == Add ==
    /// Inserts or overwrites `key`, making it the most recently used entry.
    ///
    /// A new key on a full cache evicts the least recently used entry first.
    /// On a zero-capacity cache the value is dropped.
    pub fn add(&self, key: K, value: V) -> Self {
        if self.capacity == 0 {
            return self.clone();
        }

        let base = match self.extract(&key) {
            Some((_, _, rest)) => rest,
            None => self.clone(),
        };
        let base = if base.len() >= base.capacity {
            base.evict_lru()
        } else {
            base
        };

        base.place(key, value)
    }

    /// Adds every pair in iteration order, as repeated [`add`](Self::add).
    pub fn add_all<I>(&self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        pairs
            .into_iter()
            .fold(self.clone(), |cache, (key, value)| cache.add(key, value))
    }

    // == Remove ==
    /// Drops `key` if present. Assigns no index and evicts nothing else.
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.extract(key) {
            Some((_, _, rest)) => rest,
            None => self.clone(),
        }
    }

    // == Pop LRU ==
    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&self) -> (Option<(K, V)>, Self) {
        let Some(((_, key), order)) = self.order.extract_min() else {
            return (None, self.clone());
        };
        match self.entries.remove(&key) {
            Some((key, entry, entries)) => (
                Some((key, entry.value)),
                Self {
                    entries,
                    order,
                    capacity: self.capacity,
                    clock: self.clock,
                },
            ),
            None => (None, self.clone()),
        }
    }

    // == Change Capacity ==
    /// Returns the cache resized to `new_capacity`.
    ///
    /// Growing touches no entries. Shrinking evicts least recently used
    /// entries until the rest fit. Zero yields the empty cache.
    pub fn change_capacity(&self, new_capacity: usize) -> Self {
        if new_capacity == 0 {
            if self.capacity != 0 {
                debug!(from = self.capacity, evicted = self.len(), "dropping cache to zero capacity");
            }
            return Self::empty();
        }

        if new_capacity == self.capacity {
            return self.clone();
        }

        if new_capacity > self.capacity {
            debug!(from = self.capacity, to = new_capacity, "growing cache capacity");
            return Self {
                capacity: new_capacity,
                ..self.clone()
            };
        }

        let excess = self.len().saturating_sub(new_capacity);
        debug!(
            from = self.capacity,
            to = new_capacity,
            evicted = excess,
            "shrinking cache capacity"
        );

        let mut shrunk = (0..excess).fold(self.clone(), |cache, _| cache.evict_lru());
        shrunk.capacity = new_capacity;
        shrunk
    }

    // == Bulk Construction ==
    /// Builds a cache by adding `pairs` in order to an empty cache of
    /// `capacity`. Later duplicates overwrite earlier ones; once full, the
    /// earliest pairs are evicted first.
    pub fn of_seq<I>(capacity: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::new(capacity).add_all(pairs)
    }

    pub fn of_vec(capacity: usize, pairs: Vec<(K, V)>) -> Self {
        Self::of_seq(capacity, pairs)
    }

    pub fn of_slice(capacity: usize, pairs: &[(K, V)]) -> Self {
        Self::of_seq(capacity, pairs.iter().cloned())
    }

    /// Owned pairs from least to most recently used.
    pub fn to_vec(&self) -> Vec<(K, V)> {
        self.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    // == Internal Helpers ==
    /// Takes `key` out of both maps, returning its owned key and entry.
    fn extract<Q>(&self, key: &Q) -> Option<(K, CacheEntry<V>, Self)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (owned, entry, entries) = self.entries.remove(key)?;
        let order = self.order.remove(entry.recency_index);
        Some((
            owned,
            entry,
            Self {
                entries,
                order,
                capacity: self.capacity,
                clock: self.clock,
            },
        ))
    }

    /// Stores `key` at the next recency index. Callers ensure the key is
    /// absent and that there is room for it.
    fn place(self, key: K, value: V) -> Self {
        let Some((index, clock)) = self.clock.tick() else {
            return self.compacted().place(key, value);
        };
        Self {
            entries: self.entries.insert(key.clone(), CacheEntry::new(value, index)),
            order: self.order.insert(index, key),
            capacity: self.capacity,
            clock,
        }
    }

    fn evict_lru(&self) -> Self {
        if let Some((index, _)) = self.order.first() {
            trace!(index, "evicting least recently used entry");
        }
        self.pop_lru().1
    }

    /// Renumbers live entries from zero, keeping their relative order. Only
    /// needed once the clock runs out of indices.
    fn compacted(&self) -> Self {
        debug!(entries = self.len(), "recency clock exhausted, renumbering entries");
        let (entries, order) = (0u64..).zip(self.iter()).fold(
            (KeyedEntryMap::new(), OrderedIndexMap::new()),
            |(entries, order), (index, (key, value))| {
                (
                    entries.insert(key.clone(), CacheEntry::new(value.clone(), index)),
                    order.insert(index, key.clone()),
                )
            },
        );
        Self {
            entries,
            order,
            capacity: self.capacity,
            clock: RecencyClock::starting_at(self.len() as u64),
        }
    }
}

impl<K, V> Clone for LruCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            order: self.order.clone(),
            capacity: self.capacity,
            clock: self.clock,
        }
    }
}

impl<K, V> Default for LruCache<K, V> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Structural equality: same capacity, same clock, and the same keys and
/// values at the same recency indices.
impl<K: Hash + Eq, V: PartialEq> PartialEq for LruCache<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.capacity == other.capacity
            && self.clock == other.clock
            && self.len() == other.len()
            && self
                .order
                .iter()
                .zip(other.order.iter())
                .all(|((i, k), (j, l))| {
                    i == j
                        && k == l
                        && self.entries.get(k).map(|e| &e.value)
                            == other.entries.get(l).map(|e| &e.value)
                })
    }
}

impl<K: Hash + Eq, V: Eq> Eq for LruCache<K, V> {}

impl<K: Hash + Eq + fmt::Debug, V: fmt::Debug> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("next_index", &self.clock.current())
            .field("entries", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl<'a, K: Hash + Eq, V> IntoIterator for &'a LruCache<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn keys_of(cache: &LruCache<&'static str, i32>) -> Vec<&'static str> {
        cache.keys().copied().collect()
    }

    #[test]
    fn test_lru_empty() {
        let cache: LruCache<String, i32> = LruCache::empty();

        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 0);
        assert_eq!(cache.next_index(), 0);
        assert!(cache.lru().is_none());
        assert!(cache.check_invariants().is_ok());
        assert_eq!(cache, LruCache::default());
    }

    #[test]
    fn test_lru_new_with_capacity() {
        let cache: LruCache<String, i32> = LruCache::new(16);

        assert_eq!(cache.capacity(), 16);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_from_config() {
        let cache: LruCache<String, i32> = LruCache::from_config(&CacheConfig { capacity: 3 });
        assert_eq!(cache.capacity(), 3);
    }

    #[test]
    fn test_lru_add_evicts_oldest() {
        let cache = LruCache::new(2).add("a", 1).add("b", 2).add("c", 3);

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains_key("a"));
        assert_eq!(cache.peek("b"), Some(&2));
        assert_eq!(cache.peek("c"), Some(&3));
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn test_lru_try_find_promotes() {
        let cache = LruCache::new(2).add("a", 1).add("b", 2);
        let (hit, cache) = cache.try_find("a");
        let cache = cache.add("c", 3);

        assert_eq!(hit, Some(1));
        assert_eq!(keys_of(&cache), vec!["a", "c"]);
        assert!(!cache.contains_key("b"));
    }

    #[test]
    fn test_lru_try_find_assigns_newest_index() {
        let cache = LruCache::new(4).add("a", 1).add("b", 2).add("c", 3);
        let (_, promoted) = cache.try_find("a");

        assert_eq!(promoted.recency_of("a"), Some(3));
        assert_eq!(promoted.next_index(), 4);
        assert_eq!(promoted.mru(), Some((&"a", &1)));
        assert_eq!(promoted.lru(), Some((&"b", &2)));
    }

    #[test]
    fn test_lru_miss_is_transparent() {
        let cache = LruCache::new(2).add("a", 1);
        let (miss, after) = cache.try_find("zzz");

        assert_eq!(miss, None);
        assert!(after.ptr_eq(&cache));
        assert_eq!(after.next_index(), cache.next_index());
    }

    #[test]
    fn test_lru_zero_capacity_discards() {
        let cache = LruCache::empty().add("x", 1);

        assert!(cache.is_empty());
        assert!(!cache.contains_key("x"));
        assert_eq!(cache.next_index(), 0);
    }

    #[test]
    fn test_lru_overwrite_is_one_slot() {
        let cache = LruCache::new(2).add("a", 1).add("b", 2).add("a", 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.peek("a"), Some(&10));
        assert_eq!(keys_of(&cache), vec!["b", "a"]);

        // "b" is the oldest after the overwrite, so it goes first
        let cache = cache.add("c", 3);
        assert_eq!(keys_of(&cache), vec!["a", "c"]);
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn test_lru_snapshots_stay_valid() {
        let v1 = LruCache::new(2).add("a", 1).add("b", 2);
        let v2 = v1.add("c", 3);
        let (_, v3) = v1.try_find("a");

        assert_eq!(keys_of(&v1), vec!["a", "b"]);
        assert_eq!(keys_of(&v2), vec!["b", "c"]);
        assert_eq!(keys_of(&v3), vec!["b", "a"]);
    }

    #[test]
    fn test_lru_remove() {
        let cache = LruCache::new(3).add("a", 1).add("b", 2);
        let removed = cache.remove("a");

        assert_eq!(removed.len(), 1);
        assert!(!removed.contains_key("a"));
        assert_eq!(removed.next_index(), cache.next_index());
        assert!(removed.check_invariants().is_ok());
    }

    #[test]
    fn test_lru_remove_nonexistent_key() {
        let cache = LruCache::new(3).add("a", 1);
        let same = cache.remove("nope");

        assert!(same.ptr_eq(&cache));
    }

    #[test]
    fn test_lru_peek_does_not_promote() {
        let cache = LruCache::new(2).add("a", 1).add("b", 2);

        assert_eq!(cache.peek("a"), Some(&1));
        let cache = cache.add("c", 3);
        assert!(!cache.contains_key("a"));
    }

    #[test]
    fn test_lru_pop_lru() {
        let cache = LruCache::new(3).add("a", 1).add("b", 2);
        let (popped, rest) = cache.pop_lru();

        assert_eq!(popped, Some(("a", 1)));
        assert_eq!(keys_of(&rest), vec!["b"]);
        assert_eq!(rest.next_index(), cache.next_index());

        let (nothing, empty) = LruCache::<&str, i32>::new(1).pop_lru();
        assert!(nothing.is_none());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_change_capacity_same_is_identity() {
        let cache = LruCache::new(3).add("a", 1);
        assert!(cache.change_capacity(3).ptr_eq(&cache));
    }

    #[test]
    fn test_change_capacity_grow_keeps_entries() {
        let cache = LruCache::new(2).add("a", 1).add("b", 2);
        let grown = cache.change_capacity(10);

        assert_eq!(grown.capacity(), 10);
        assert_eq!(grown.to_vec(), cache.to_vec());
        assert_eq!(grown.next_index(), cache.next_index());
        assert_eq!(grown.change_capacity(10), grown);
    }

    #[test]
    fn test_change_capacity_shrink_evicts_oldest() {
        let cache = LruCache::of_slice(5, &[("a", 1), ("b", 2), ("c", 3), ("d", 4)]);
        let (_, cache) = cache.try_find("a");
        let shrunk = cache.change_capacity(2);

        assert_eq!(shrunk.capacity(), 2);
        assert_eq!(keys_of(&shrunk), vec!["d", "a"]);
        assert!(shrunk.check_invariants().is_ok());
    }

    #[test]
    fn test_change_capacity_shrink_without_eviction() {
        let cache = LruCache::new(10).add("a", 1).add("b", 2);
        let shrunk = cache.change_capacity(5);

        assert_eq!(shrunk.capacity(), 5);
        assert_eq!(shrunk.len(), 2);
    }

    #[test]
    fn test_change_capacity_zero_is_empty() {
        let cache = LruCache::new(4).add("a", 1).add("b", 2);
        let zeroed = cache.change_capacity(0);

        assert_eq!(zeroed, LruCache::empty());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_of_seq_duplicates_overwrite() {
        let cache = LruCache::of_vec(2, vec![("a", 1), ("a", 2), ("b", 3)]);

        assert_eq!(cache.to_vec(), vec![("a", 2), ("b", 3)]);
    }

    #[test]
    fn test_of_seq_longer_than_capacity() {
        let cache = LruCache::of_seq(3, (0..10).map(|i| (i, i * 10)));

        assert_eq!(cache.to_vec(), vec![(7, 70), (8, 80), (9, 90)]);
    }

    #[test]
    fn test_iter_does_not_promote() {
        let cache = LruCache::new(3).add("a", 1).add("b", 2);
        let before = cache.next_index();
        let pairs: Vec<(&&str, &i32)> = cache.iter().collect();

        assert_eq!(pairs, vec![(&"a", &1), (&"b", &2)]);
        assert_eq!(cache.next_index(), before);
        assert_eq!(keys_of(&cache), vec!["a", "b"]);
    }

    #[test]
    fn test_iter_rev_is_mru_first() {
        let cache = LruCache::of_slice(3, &[("a", 1), ("b", 2), ("c", 3)]);
        let keys: Vec<&str> = cache.keys().rev().copied().collect();
        let values: Vec<i32> = cache.values().copied().collect();

        assert_eq!(keys, vec!["c", "b", "a"]);
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_exhausted_clock_renumbers() {
        let cache: LruCache<&str, i32> = LruCache {
            clock: RecencyClock::starting_at(u64::MAX - 2),
            ..LruCache::new(3)
        };

        let cache = cache.add("a", 1).add("b", 2);
        assert_eq!(cache.next_index(), u64::MAX);

        let cache = cache.add("c", 3);
        assert_eq!(keys_of(&cache), vec!["a", "b", "c"]);
        assert_eq!(cache.recency_of("a"), Some(0));
        assert_eq!(cache.recency_of("c"), Some(2));
        assert_eq!(cache.next_index(), 3);
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn test_check_invariants_detects_drift() {
        let cache = LruCache::new(3).add("a", 1);
        let broken = LruCache {
            order: OrderedIndexMap::new(),
            ..cache
        };

        assert!(matches!(
            broken.check_invariants(),
            Err(CacheError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_debug_lists_entries_in_order() {
        let cache = LruCache::new(2).add("a", 1).add("b", 2);
        let rendered = format!("{:?}", cache);

        assert!(rendered.contains("capacity: 2"));
        assert!(rendered.contains(r#"("a", 1), ("b", 2)"#));
    }
}
