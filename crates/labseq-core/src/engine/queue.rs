//! Sliding queue of admitted observations.
//!
//! The queue holds the history used for eviction-window computation. It is
//! bounded by time span, not by count: the pop policy evicts stale heads
//! before each row is considered. A single synthetic sentinel entry can
//! stand in for "the last abnormal event" after the queue is cleared, so
//! recency can be tracked without keeping full history.

use std::collections::VecDeque;

/// A queue entry: a real admitted row, or the sentinel marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<R> {
    Row(R),
    Sentinel(R),
}

impl<R> Entry<R> {
    /// The underlying row, for either variant.
    pub fn row(&self) -> &R {
        match self {
            Entry::Row(r) | Entry::Sentinel(r) => r,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Entry::Sentinel(_))
    }
}

/// Ordered sliding history for one (entity group, window size) pass.
#[derive(Debug, Clone)]
pub struct SlidingQueue<R> {
    entries: VecDeque<Entry<R>>,
}

impl<R> Default for SlidingQueue<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> SlidingQueue<R> {
    pub fn new() -> Self {
        SlidingQueue {
            entries: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-sentinel entries.
    pub fn normal_len(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_sentinel()).count()
    }

    /// True when the queue holds exactly the sentinel entry.
    pub fn is_sentinel_only(&self) -> bool {
        self.entries.len() == 1 && self.entries[0].is_sentinel()
    }

    pub fn has_sentinel(&self) -> bool {
        self.entries.iter().any(|e| e.is_sentinel())
    }

    pub fn front(&self) -> Option<&Entry<R>> {
        self.entries.front()
    }

    pub fn pop_front(&mut self) -> Option<Entry<R>> {
        self.entries.pop_front()
    }

    /// Append an admitted row at the tail.
    pub fn push(&mut self, row: R) {
        self.entries.push_back(Entry::Row(row));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Empty the queue, retaining `row` as the single sentinel entry.
    pub fn clear_to_sentinel(&mut self, row: R) {
        self.entries.clear();
        self.entries.push_back(Entry::Sentinel(row));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<R>> {
        self.entries.iter()
    }
}
