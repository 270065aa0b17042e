//! Ordered Index Map Module
//!
//! Persistent map from recency index to key. Ascending traversal goes from
//! the least recently used key to the most recently used one.

use std::fmt;

use crate::map::tree::{Iter, PersistentTree};

// == Ordered Index Map ==
pub struct OrderedIndexMap<K> {
    tree: PersistentTree<u64, K>,
}

impl<K> OrderedIndexMap<K> {
    // == Constructor ==
    pub const fn new() -> Self {
        Self {
            tree: PersistentTree::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.tree.ptr_eq(&other.tree)
    }

    pub fn get(&self, index: u64) -> Option<&K> {
        self.tree.get(&index)
    }

    /// Entry with the smallest index (the LRU key).
    pub fn first(&self) -> Option<(u64, &K)> {
        self.tree.min().map(|(index, key)| (*index, key))
    }

    /// Entry with the largest index (the MRU key).
    pub fn last(&self) -> Option<(u64, &K)> {
        self.tree.max().map(|(index, key)| (*index, key))
    }

    /// Ascending index order; reverse it for MRU first.
    pub fn iter(&self) -> Iter<'_, u64, K> {
        self.tree.iter()
    }
}

impl<K: Clone> OrderedIndexMap<K> {
    pub fn insert(&self, index: u64, key: K) -> Self {
        Self {
            tree: self.tree.insert(index, key),
        }
    }

    /// Drops `index`; hands back an identical map when it is absent.
    pub fn remove(&self, index: u64) -> Self {
        match self.tree.remove(&index) {
            Some((_, tree)) => Self { tree },
            None => self.clone(),
        }
    }

    /// Splits off the entry with the smallest index.
    pub fn extract_min(&self) -> Option<((u64, K), Self)> {
        self.tree
            .extract_min()
            .map(|(min, tree)| (min, Self { tree }))
    }
}

impl<K> Clone for OrderedIndexMap<K> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<K> Default for OrderedIndexMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for OrderedIndexMap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.tree, f)
    }
}
