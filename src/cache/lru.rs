//! LRU Ranking Module
//!
//! Recency bookkeeping for slot eviction.
//!
//! Every slot carries an integer rank. A freshly written slot is promoted to
//! a rank above any rank the cache can hold and every other slot decays by
//! one, so ranks stay relatively ordered without being a dense permutation.
//! Only writes change ordering; lookups leave ranks untouched.

// == Promoted Rank ==
/// Rank given to the slot just written in a cache of `capacity` slots.
///
/// Ranks never grow after promotion, so this is always the strict maximum.
pub fn promoted_rank(capacity: usize) -> i64 {
    capacity as i64 + 1
}

// == Victim Scan ==
/// Incremental victim selection over slots visited in index order.
///
/// The first unallocated slot wins immediately. Otherwise the slot with the
/// lowest rank wins, ties going to the lowest index.
#[derive(Debug, Default)]
pub struct VictimScan {
    /// Lowest (index, rank) seen so far
    stalest: Option<(usize, i64)>,
}

impl VictimScan {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Observe ==
    /// Records one slot. Returns `Some(index)` when the scan can stop early.
    pub fn observe(&mut self, index: usize, allocated: bool, recency: i64) -> Option<usize> {
        if !allocated {
            return Some(index);
        }
        match self.stalest {
            // strict less-than keeps the lowest index on ties
            Some((_, min)) if recency >= min => {}
            _ => self.stalest = Some((index, recency)),
        }
        None
    }

    // == Finish ==
    /// Returns the stalest slot seen, or None if nothing was observed.
    pub fn finish(self) -> Option<usize> {
        self.stalest.map(|(index, _)| index)
    }
}
