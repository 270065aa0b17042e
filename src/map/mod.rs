//! Persistent Map Module
//!
//! Immutable maps the LRU cache is built from. Every update returns a new
//! map and leaves the old one intact.

mod keyed;
mod ordered;
mod tree;

pub use keyed::KeyedEntryMap;
pub use ordered::OrderedIndexMap;
pub use tree::{Iter, PersistentTree};
