//! Hook strategy for the sequence engine.
//!
//! All business rules live behind [`QueueHooks`]: one method per hook role,
//! taking the window size, a queue snapshot, the per-pass state, and the
//! current row, and returning an explicit decision. The engine itself never
//! hardcodes admission, eviction, or clearing policy.
//!
//! State is an associated type created fresh per (entity group, window
//! size) pass; it is the only carrier of cross-row information besides the
//! queue itself.

use super::queue::SlidingQueue;
use std::hash::Hash;

/// What to do with the queue after the admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearMode {
    /// Leave the queue as is.
    Keep,
    /// Empty the queue.
    Drop,
    /// Empty the queue and retain the current row as the sentinel.
    ToSentinel,
}

/// Caller-supplied policy driving the per-row state machine.
///
/// For each incoming row the engine applies the hooks in a fixed order:
/// eviction (or the sentinel-only bypass), admission, clearing, key
/// extraction, then post-row mutation. See [`super::SequenceAnalyzer`].
pub trait QueueHooks {
    /// Row type fed through the engine.
    type Row: Clone;
    /// Grouping key; all rows sharing it form one entity group.
    type Group: Clone + Eq + Hash;
    /// Statistic key carried by emissions.
    type Key;
    /// Per-(group, window) state, created fresh for every pass.
    type State;

    /// Extract the grouping key from a row.
    fn group_key(&self, row: &Self::Row) -> Self::Group;

    /// State each pass starts from.
    fn initial_state(&self) -> Self::State;

    /// Pop policy: evict the queue head while this returns true.
    fn should_evict(&self, window: u32, head: &Self::Row, row: &Self::Row) -> bool;

    /// Invoked instead of the pop loop when the queue holds exactly the
    /// sentinel; compares `row` against the sentinel to update state.
    fn on_sentinel(
        &self,
        _window: u32,
        _state: &mut Self::State,
        _sentinel: &Self::Row,
        _row: &Self::Row,
    ) {
    }

    /// Invoked when the pop loop empties a previously non-empty queue.
    fn on_emptied(&self, _window: u32, _state: &mut Self::State, _row: &Self::Row) {}

    /// Admission gate; on true the row is appended to the queue.
    fn admit(
        &self,
        window: u32,
        queue: &SlidingQueue<Self::Row>,
        state: &Self::State,
        row: &Self::Row,
    ) -> bool;

    /// Clearing decision, evaluated after the admission attempt.
    fn clear_after(
        &self,
        _window: u32,
        _queue: &SlidingQueue<Self::Row>,
        _state: &Self::State,
        _row: &Self::Row,
        _row_added: bool,
    ) -> ClearMode {
        ClearMode::Keep
    }

    /// Produce the keyed statistic for the current row.
    fn emit(
        &self,
        window: u32,
        queue: &SlidingQueue<Self::Row>,
        state: &Self::State,
        row_added: bool,
    ) -> (Self::Key, u64);

    /// Post-row state mutation, applied after the emission is computed.
    fn after_row(
        &self,
        _window: u32,
        _queue: &SlidingQueue<Self::Row>,
        _state: &mut Self::State,
        _row: &Self::Row,
        _row_added: bool,
    ) {
    }
}
