//! Cache Entry Module
//!
//! Defines the value slot stored for each cached key.

// == Cache Entry ==
/// A cached value together with the recency index it was last touched at.
///
/// The same index is mirrored as the key of the cache's order map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Recency index of the last touch; larger is more recent
    pub recency_index: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    pub fn new(value: V, recency_index: u64) -> Self {
        Self {
            value,
            recency_index,
        }
    }
}
