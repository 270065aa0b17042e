//! Serde support for [`LruCache`].
//!
//! A cache serializes as its capacity plus its pairs from least to most
//! recently used:
//!
//! ```json
//! { "capacity": 2, "entries": [["a", 1], ["b", 2]] }
//! ```
//!
//! Recency indices are not written. Deserializing replays the pairs through
//! [`LruCache::of_vec`], which preserves their order and renumbers from zero.

use std::hash::Hash;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::cache::LruCache;

/// Borrowed view of the pairs, serialized as a sequence.
struct Entries<'a, K, V>(&'a LruCache<K, V>);

impl<K: Hash + Eq + Serialize, V: Serialize> Serialize for Entries<'_, K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<K: Hash + Eq + Serialize, V: Serialize> Serialize for LruCache<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("LruCache", 2)?;
        state.serialize_field("capacity", &self.capacity())?;
        state.serialize_field("entries", &Entries(self))?;
        state.end()
    }
}

#[derive(serde::Deserialize)]
#[serde(rename = "LruCache")]
struct Snapshot<K, V> {
    capacity: usize,
    entries: Vec<(K, V)>,
}

impl<'de, K, V> Deserialize<'de> for LruCache<K, V>
where
    K: Hash + Eq + Clone + Deserialize<'de>,
    V: Clone + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snapshot = Snapshot::<K, V>::deserialize(deserializer)?;
        Ok(LruCache::of_vec(snapshot.capacity, snapshot.entries))
    }
}
