//! Cache Iterator Module
//!
//! Recency-ordered traversal of an [`LruCache`](crate::LruCache).

use std::hash::Hash;

use crate::cache::entry::CacheEntry;
use crate::map::{self, KeyedEntryMap};

// == Iterator ==
/// Borrowing iterator over `(key, value)` pairs, least recently used first.
///
/// Walks the order map and resolves each key in the entry map.
pub struct Iter<'a, K, V> {
    order: map::Iter<'a, u64, K>,
    entries: &'a KeyedEntryMap<K, CacheEntry<V>>,
}

impl<'a, K: Hash + Eq, V> Iter<'a, K, V> {
    pub(crate) fn new(
        order: map::Iter<'a, u64, K>,
        entries: &'a KeyedEntryMap<K, CacheEntry<V>>,
    ) -> Self {
        Self { order, entries }
    }

    fn resolve(&self, index: &u64, key: &'a K) -> Option<(&'a K, &'a V)> {
        let entries = self.entries;
        let entry = entries.get(key)?;
        debug_assert_eq!(
            entry.recency_index, *index,
            "entry index disagrees with order index"
        );
        Some((key, &entry.value))
    }
}

impl<'a, K: Hash + Eq, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (index, key) = self.order.next()?;
            if let Some(pair) = self.resolve(index, key) {
                return Some(pair);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.order.size_hint().1)
    }
}

impl<K: Hash + Eq, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        loop {
            let (index, key) = self.order.next_back()?;
            if let Some(pair) = self.resolve(index, key) {
                return Some(pair);
            }
        }
    }
}
