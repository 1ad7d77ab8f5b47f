use std::ops::Range;

use tracing::trace;

/// How much of a row set is currently exposed to the grid.
///
/// The window is always a prefix `[0, materialized_count)` of the row set.
/// Growing appends the next contiguous slice and never reorders or drops
/// rows; only a new row set (new search, dataset reload) resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewWindow {
    materialized_count: u64,
    total_count: u64,
}
impl ViewWindow {
    pub fn new(total_count: u64, initial_batch: u32) -> Self {
        Self {
            materialized_count: u64::from(initial_batch).min(total_count),
            total_count,
        }
    }
    pub fn materialized_count(&self) -> u64 {
        self.materialized_count
    }
    pub fn total_count(&self) -> u64 {
        self.total_count
    }
    pub fn can_grow(&self) -> bool {
        self.materialized_count < self.total_count
    }
    /// Materializes up to `batch_size` more rows, returning how many were added.
    pub fn grow(&mut self, batch_size: u32) -> u64 {
        let added = u64::from(batch_size).min(self.total_count - self.materialized_count);
        self.materialized_count += added;
        trace!(
            added,
            materialized = self.materialized_count,
            total = self.total_count,
            "window grown"
        );
        added
    }
    pub fn reset(&mut self, total_count: u64, initial_batch: u32) {
        *self = Self::new(total_count, initial_batch);
    }
    pub fn range(&self) -> Range<u64> {
        0..self.materialized_count
    }
    pub fn contains(&self, position: u64) -> bool {
        position < self.materialized_count
    }
    /// Whether a scroll position (the last visible row) has come within
    /// `proximity` rows of the materialized boundary while more rows exist.
    pub fn near_boundary(&self, position: u64, proximity: u32) -> bool {
        self.can_grow() && position.saturating_add(u64::from(proximity)) >= self.materialized_count
    }
    /// Grows batch by batch until `position` is materialized. Returns false
    /// if the position lies beyond the row set.
    pub fn reveal(&mut self, position: u64, batch_size: u32) -> bool {
        if position >= self.total_count || batch_size == 0 {
            return self.contains(position);
        }
        while !self.contains(position) {
            self.grow(batch_size);
        }
        true
    }
}

pub fn can_grow(window: &ViewWindow) -> bool {
    window.can_grow()
}

pub fn grow(window: &mut ViewWindow, batch_size: u32) {
    window.grow(batch_size);
}
