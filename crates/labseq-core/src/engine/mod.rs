//! Windowed sequence-aggregation engine.
//!
//! [`SequenceAnalyzer`] executes the per-row state machine over grouped,
//! time-ordered input, independently for every configured window size. Per
//! (entity group, window size) pass it owns one [`SlidingQueue`] plus one
//! hook-defined state value, and produces one [`Emission`] per row.
//!
//! Per-row order, which determines correctness downstream:
//!
//! 1. evict stale queue heads via the pop policy (bypassed in favor of the
//!    sentinel handler when the queue holds exactly the sentinel); run the
//!    emptied handler if eviction drained the queue;
//! 2. evaluate the admission gate; on success the row joins the queue;
//! 3. evaluate the clearing decision;
//! 4. extract the keyed statistic, tagged with the admission outcome;
//! 5. apply post-row state mutation.
//!
//! Unsorted timestamps within a group yield undefined eviction results;
//! sorting input is the caller's precondition. Hook panics are not caught.

pub mod builder;
pub mod hooks;
pub mod queue;

pub use builder::SequenceAnalyzerBuilder;
pub use hooks::{ClearMode, QueueHooks};
pub use queue::{Entry, SlidingQueue};

use labseq_common::{Error, Result};
use std::collections::HashMap;
use std::hash::Hash;
use tracing::trace;

/// One statistic produced for one processed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission<G, K> {
    /// Entity group the row belongs to.
    pub group: G,
    /// Statistic key, e.g. (window size, consecutive-normal count).
    pub key: K,
    /// Increment to fold into the aggregate for `key`.
    pub value: u64,
    /// Whether the row passed the admission gate.
    pub row_added: bool,
}

/// Partition rows into entity groups sharing a key.
///
/// In-group row order follows input order, and groups are yielded in
/// first-seen order. The input is consumed in one pass; the returned
/// iterator is finite and not restartable.
pub fn split_on_key<R, G, F, I>(rows: I, key_fn: F) -> impl Iterator<Item = (G, Vec<R>)>
where
    G: Clone + Eq + Hash,
    F: Fn(&R) -> G,
    I: IntoIterator<Item = R>,
{
    let mut order: Vec<(G, Vec<R>)> = Vec::new();
    let mut index: HashMap<G, usize> = HashMap::new();
    for row in rows {
        let key = key_fn(&row);
        match index.get(&key) {
            Some(&i) => order[i].1.push(row),
            None => {
                index.insert(key.clone(), order.len());
                order.push((key, vec![row]));
            }
        }
    }
    order.into_iter()
}

/// The engine: a hook strategy plus the run loop.
#[derive(Debug)]
pub struct SequenceAnalyzer<H: QueueHooks> {
    hooks: H,
}

impl<H: QueueHooks> SequenceAnalyzer<H> {
    pub fn new(hooks: H) -> Self {
        SequenceAnalyzer { hooks }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Replay `rows` through the state machine for every window size.
    ///
    /// Rows are grouped by the hook-provided key; each (group, window)
    /// pass runs with a fresh queue and state. The returned iterator is
    /// lazy, finite, and not restartable; re-supply input to re-run.
    ///
    /// Fails with a configuration error when `windows` is empty.
    pub fn run(&self, rows: Vec<H::Row>, windows: &[u32]) -> Result<Run<'_, H>> {
        if windows.is_empty() {
            return Err(Error::Config("no window sizes supplied".into()));
        }
        let groups: Vec<(H::Group, Vec<H::Row>)> =
            split_on_key(rows, |row| self.hooks.group_key(row)).collect();
        Ok(Run {
            hooks: &self.hooks,
            groups,
            windows: windows.to_vec(),
            group_idx: 0,
            window_idx: 0,
            row_idx: 0,
            queue: SlidingQueue::new(),
            state: self.hooks.initial_state(),
        })
    }
}

/// Lazy emission stream for one engine run.
///
/// Debug output shows the cursor position only; rows, hooks, and state
/// need no formatting bounds.
pub struct Run<'a, H: QueueHooks> {
    hooks: &'a H,
    groups: Vec<(H::Group, Vec<H::Row>)>,
    windows: Vec<u32>,
    group_idx: usize,
    window_idx: usize,
    row_idx: usize,
    queue: SlidingQueue<H::Row>,
    state: H::State,
}

impl<H: QueueHooks> std::fmt::Debug for Run<'_, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Run")
            .field("groups", &self.groups.len())
            .field("windows", &self.windows)
            .field("group_idx", &self.group_idx)
            .field("window_idx", &self.window_idx)
            .field("row_idx", &self.row_idx)
            .finish_non_exhaustive()
    }
}

impl<H: QueueHooks> Run<'_, H> {
    fn reset_pass(&mut self) {
        self.row_idx = 0;
        self.queue = SlidingQueue::new();
        self.state = self.hooks.initial_state();
    }

    /// Apply the per-row state machine to one row, producing its emission.
    fn step(&mut self, window: u32, row: &H::Row) -> (H::Key, u64, bool) {
        // 1. Sentinel-only bypass, otherwise the pop loop.
        if self.queue.is_sentinel_only() {
            let sentinel = self.queue.front().map(|e| e.row().clone());
            if let Some(sentinel) = sentinel {
                self.hooks.on_sentinel(window, &mut self.state, &sentinel, row);
            }
        } else {
            let was_populated = !self.queue.is_empty();
            let mut evicted = 0usize;
            while let Some(head) = self.queue.front() {
                if self.hooks.should_evict(window, head.row(), row) {
                    self.queue.pop_front();
                    evicted += 1;
                } else {
                    break;
                }
            }
            if evicted > 0 {
                trace!(window, evicted, remaining = self.queue.len(), "evicted stale heads");
            }
            if was_populated && self.queue.is_empty() {
                self.hooks.on_emptied(window, &mut self.state, row);
            }
        }

        // 2. Admission.
        let row_added = self.hooks.admit(window, &self.queue, &self.state, row);
        if row_added {
            self.queue.push(row.clone());
        }

        // 3. Clearing.
        match self
            .hooks
            .clear_after(window, &self.queue, &self.state, row, row_added)
        {
            ClearMode::Keep => {}
            ClearMode::Drop => {
                trace!(window, "queue dropped");
                self.queue.clear();
            }
            ClearMode::ToSentinel => {
                trace!(window, "queue cleared to sentinel");
                self.queue.clear_to_sentinel(row.clone());
            }
        }

        // 4. Key extraction.
        let (key, value) = self.hooks.emit(window, &self.queue, &self.state, row_added);

        // 5. Post-row mutation.
        self.hooks
            .after_row(window, &self.queue, &mut self.state, row, row_added);

        (key, value, row_added)
    }
}

impl<H: QueueHooks> Iterator for Run<'_, H> {
    type Item = Emission<H::Group, H::Key>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rows_len = self.groups.get(self.group_idx)?.1.len();

            if rows_len == 0 {
                self.group_idx += 1;
                continue;
            }

            if self.row_idx >= rows_len {
                // Pass finished: next window, then next group.
                self.window_idx += 1;
                if self.window_idx >= self.windows.len() {
                    self.window_idx = 0;
                    self.group_idx += 1;
                }
                self.reset_pass();
                continue;
            }

            let window = self.windows[self.window_idx];
            let row = self.groups[self.group_idx].1[self.row_idx].clone();
            let group = self.groups[self.group_idx].0.clone();
            self.row_idx += 1;

            let (key, value, row_added) = self.step(window, &row);
            return Some(Emission {
                group,
                key,
                value,
                row_added,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Count-runs hooks used by engine unit tests: admit everything,
    /// evict heads more than `window` behind the current position, emit
    /// the number of queued predecessors.
    struct CountRuns;

    impl QueueHooks for CountRuns {
        type Row = (u32, i64); // (group, position)
        type Group = u32;
        type Key = (u32, usize);
        type State = ();

        fn group_key(&self, row: &Self::Row) -> u32 {
            row.0
        }

        fn initial_state(&self) {}

        fn should_evict(&self, window: u32, head: &Self::Row, row: &Self::Row) -> bool {
            row.1 - head.1 >= i64::from(window)
        }

        fn admit(
            &self,
            _window: u32,
            _queue: &SlidingQueue<Self::Row>,
            _state: &(),
            _row: &Self::Row,
        ) -> bool {
            true
        }

        fn emit(
            &self,
            window: u32,
            queue: &SlidingQueue<Self::Row>,
            _state: &(),
            row_added: bool,
        ) -> (Self::Key, u64) {
            ((window, queue.normal_len() - usize::from(row_added)), 1)
        }
    }

    #[test]
    fn test_split_on_key_preserves_order() {
        let rows = vec![(1, 'a'), (2, 'b'), (1, 'c'), (3, 'd'), (2, 'e')];
        let groups: Vec<_> = split_on_key(rows, |r| r.0).collect();
        assert_eq!(
            groups,
            vec![
                (1, vec![(1, 'a'), (1, 'c')]),
                (2, vec![(2, 'b'), (2, 'e')]),
                (3, vec![(3, 'd')]),
            ]
        );
    }

    #[test]
    fn test_run_debug_shows_cursor_only() {
        let analyzer = SequenceAnalyzer::new(CountRuns);
        let run = analyzer.run(vec![(1, 0), (1, 1)], &[3, 7]).unwrap();
        let repr = format!("{:?}", run);
        assert!(repr.contains("Run"), "{repr}");
        assert!(repr.contains("windows: [3, 7]"), "{repr}");
    }

    #[test]
    fn test_run_rejects_empty_windows() {
        let analyzer = SequenceAnalyzer::new(CountRuns);
        let err = analyzer.run(vec![(1, 0)], &[]).unwrap_err();
        assert_eq!(err.code(), 10);
    }

    #[test]
    fn test_one_emission_per_row_per_window() {
        let analyzer = SequenceAnalyzer::new(CountRuns);
        let rows = vec![(1, 0), (1, 1), (1, 2), (2, 0), (2, 5)];
        let emissions: Vec<_> = analyzer.run(rows, &[2, 10]).unwrap().collect();
        assert_eq!(emissions.len(), 5 * 2);
    }

    #[test]
    fn test_eviction_resets_run() {
        let analyzer = SequenceAnalyzer::new(CountRuns);
        let rows = vec![(1, 0), (1, 1), (1, 10), (1, 11)];
        let emissions: Vec<_> = analyzer.run(rows, &[3]).unwrap().collect();
        let counts: Vec<usize> = emissions.iter().map(|e| e.key.1).collect();
        // Position 10 is out of window 3 from both predecessors.
        assert_eq!(counts, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_groups_are_independent() {
        let analyzer = SequenceAnalyzer::new(CountRuns);
        // Interleaved groups; each group's second row is adjacent in time.
        let rows = vec![(1, 0), (2, 100), (1, 1), (2, 101)];
        let emissions: Vec<_> = analyzer.run(rows, &[5]).unwrap().collect();
        let per_group: Vec<(u32, usize)> = emissions.iter().map(|e| (e.group, e.key.1)).collect();
        assert_eq!(per_group, vec![(1, 0), (1, 1), (2, 0), (2, 1)]);
    }

    #[test]
    fn test_windows_replay_independently() {
        let analyzer = SequenceAnalyzer::new(CountRuns);
        let rows = vec![(1, 0), (1, 4)];
        let emissions: Vec<_> = analyzer.run(rows, &[3, 10]).unwrap().collect();
        assert_eq!(
            emissions
                .iter()
                .map(|e| (e.key.0, e.key.1))
                .collect::<Vec<_>>(),
            vec![(3, 0), (3, 0), (10, 0), (10, 1)]
        );
    }
}
