//! Recency Clock Module
//!
//! Monotonic counter handing out recency indices.

// == Recency Clock ==
/// Source of recency indices for one cache lineage.
///
/// Each tick hands out the current value and advances by one, so indices are
/// strictly increasing and never reused. Higher means more recently used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RecencyClock {
    next: u64,
}

impl RecencyClock {
    // == Constructor ==
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Clock whose next tick hands out `next`.
    pub(crate) const fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// The index the next tick will hand out.
    pub fn current(&self) -> u64 {
        self.next
    }

    // == Tick ==
    /// Returns the index to assign and the advanced clock, or `None` once the
    /// counter cannot move forward any more.
    pub fn tick(self) -> Option<(u64, Self)> {
        let next = self.next.checked_add(1)?;
        Some((self.next, Self { next }))
    }
}
