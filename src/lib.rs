//! Persistent LRU - an immutable Least Recently Used cache
//!
//! Every operation returns a new cache value and leaves the old one valid,
//! so snapshots can be shared freely between threads without locking.
//! Callers that need a single "current" cache across threads keep it behind
//! their own atomically swapped reference.

pub mod cache;
pub mod config;
pub mod error;
pub mod map;

pub use cache::{CacheEntry, LruCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
