//! Keyed Entry Map Module
//!
//! Persistent hash-keyed map used to find a cache key's slot.

use std::borrow::Borrow;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::map::tree::PersistentTree;

/// Keys sharing one hash. Almost always a single pair.
type Bucket<K, V> = Arc<Vec<(K, V)>>;

/// Hashes with fixed SipHash keys so two maps holding the same keys always
/// agree on placement, whichever lineage they come from.
fn hash_of<Q: Hash + ?Sized>(key: &Q) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

// == Keyed Entry Map ==
/// Immutable map from `K` to `V`, keyed by `Hash` + `Eq`.
///
/// Stored as a [`PersistentTree`] from hash to a bucket of colliding pairs,
/// so updates share structure exactly like the tree does.
pub struct KeyedEntryMap<K, V> {
    buckets: PersistentTree<u64, Bucket<K, V>>,
    len: usize,
}

impl<K, V> KeyedEntryMap<K, V> {
    // == Constructor ==
    pub const fn new() -> Self {
        Self {
            buckets: PersistentTree::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.buckets.ptr_eq(&other.buckets)
    }

    /// Visits every pair in hash order (not insertion or recency order).
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.buckets
            .iter()
            .flat_map(|(_, bucket)| bucket.iter().map(|(k, v)| (k, v)))
    }
}

impl<K: Hash + Eq, V> KeyedEntryMap<K, V> {
    // == Lookup ==
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets
            .get(&hash_of(key))?
            .iter()
            .find(|(k, _)| <K as Borrow<Q>>::borrow(k) == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }
}

impl<K: Hash + Eq + Clone, V: Clone> KeyedEntryMap<K, V> {
    // == Insert ==
    /// Returns a new map with `key` mapped to `value`, overwriting any
    /// previous value for an equal key.
    pub fn insert(&self, key: K, value: V) -> Self {
        let hash = hash_of(&key);
        let mut bucket: Vec<(K, V)> = match self.buckets.get(&hash) {
            Some(existing) => existing
                .iter()
                .filter(|(k, _)| *k != key)
                .cloned()
                .collect(),
            None => Vec::with_capacity(1),
        };
        let replaced = self
            .buckets
            .get(&hash)
            .map_or(false, |existing| existing.len() != bucket.len());

        bucket.push((key, value));

        Self {
            buckets: self.buckets.insert(hash, Arc::new(bucket)),
            len: if replaced { self.len } else { self.len + 1 },
        }
    }

    // == Remove ==
    /// Returns the owned key, its value, and the map without it; `None` when
    /// the key is absent.
    pub fn remove<Q>(&self, key: &Q) -> Option<(K, V, Self)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = hash_of(key);
        let bucket = self.buckets.get(&hash)?;
        let position = bucket.iter().position(|(k, _)| <K as Borrow<Q>>::borrow(k) == key)?;
        let (owned_key, value) = bucket[position].clone();

        let buckets = if bucket.len() == 1 {
            self.buckets.remove(&hash).map(|(_, rest)| rest)?
        } else {
            let rest: Vec<(K, V)> = bucket
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != position)
                .map(|(_, pair)| pair.clone())
                .collect();
            self.buckets.insert(hash, Arc::new(rest))
        };

        Some((
            owned_key,
            value,
            Self {
                buckets,
                len: self.len - 1,
            },
        ))
    }
}

impl<K, V> Clone for KeyedEntryMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            len: self.len,
        }
    }
}

impl<K, V> Default for KeyedEntryMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for KeyedEntryMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    /// Key whose hash ignores everything but `group`, forcing collisions.
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Colliding {
        group: u8,
        id: u32,
    }

    impl Hash for Colliding {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.group.hash(state);
        }
    }

    #[test]
    fn test_keyed_insert_and_get() {
        let map = KeyedEntryMap::new()
            .insert("a".to_string(), 1)
            .insert("b".to_string(), 2);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.get("b"), Some(&2));
        assert_eq!(map.get("c"), None);
    }

    #[test]
    fn test_keyed_overwrite_keeps_len() {
        let map = KeyedEntryMap::new()
            .insert("a".to_string(), 1)
            .insert("a".to_string(), 5);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("a"), Some(&5));
    }

    #[test]
    fn test_keyed_remove_returns_owned_key() {
        let map = KeyedEntryMap::new().insert("a".to_string(), 1);
        let (key, value, rest) = map.remove("a").unwrap();

        assert_eq!(key, "a");
        assert_eq!(value, 1);
        assert!(rest.is_empty());
        assert!(map.contains_key("a"));
    }

    #[test]
    fn test_keyed_remove_absent() {
        let map = KeyedEntryMap::new().insert("a".to_string(), 1);
        assert!(map.remove("zzz").is_none());
    }

    #[test]
    fn test_keyed_collisions_are_kept_apart() {
        let x = Colliding { group: 1, id: 10 };
        let y = Colliding { group: 1, id: 20 };
        let z = Colliding { group: 2, id: 10 };

        let map = KeyedEntryMap::new()
            .insert(x.clone(), "x")
            .insert(y.clone(), "y")
            .insert(z.clone(), "z");

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&x), Some(&"x"));
        assert_eq!(map.get(&y), Some(&"y"));

        let map = map.insert(y.clone(), "y2");
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&y), Some(&"y2"));

        let (_, removed, map) = map.remove(&x).unwrap();
        assert_eq!(removed, "x");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&x), None);
        assert_eq!(map.get(&y), Some(&"y2"));
        assert_eq!(map.get(&z), Some(&"z"));
    }

    #[test]
    fn test_keyed_iter_visits_everything() {
        let map = (0..50).fold(KeyedEntryMap::new(), |m, i| m.insert(i, i * 2));

        let mut pairs: Vec<(i32, i32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        pairs.sort();

        assert_eq!(pairs.len(), 50);
        assert!(pairs.iter().all(|(k, v)| *v == k * 2));
    }
}
