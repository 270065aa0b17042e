//! Cache Module
//!
//! Provides the persistent LRU cache and its building blocks.

mod clock;
mod entry;
mod iter;
mod lru;
mod serde_impl;


// Re-export public types
pub use clock::RecencyClock;
pub use entry::CacheEntry;
pub use iter::Iter;
pub use lru::LruCache;
