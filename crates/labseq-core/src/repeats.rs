//! Consecutive-normal repeat analysis for lab results.
//!
//! [`RepeatNormals`] configures the engine for the repeat-lab question:
//! at each result draw, how many consecutive normal results precede it
//! within the window? Normal rows join the queue; any abnormal row resets
//! the run and is retained as the sentinel so the date of the last
//! abnormal event survives the reset.
//!
//! Emission rules, per row and window:
//! - an abnormal event inside the window (the sentinel is still queued and
//!   recent) contaminates the history: key `(window, None)`;
//! - otherwise the key is `(window, Some(n))`, `n` counting queued normal
//!   rows excluding the row just admitted — `Some(0)` covers both fresh
//!   history and runs broken by eviction.
//!
//! A queue head exactly `window` whole days old is stale: eviction and
//! sentinel recency both use a strict within-window comparison.

use crate::aggregate::StatKey;
use crate::engine::{ClearMode, QueueHooks, SlidingQueue};
use chrono::NaiveDateTime;
use labseq_common::time::day_difference;
use labseq_common::EntityId;
use serde::{Deserialize, Serialize};

/// One lab-test result draw. Immutable once read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    /// Patient the draw belongs to.
    pub patient: EntityId,
    /// Test label encoding lab code and result flag, e.g. `11210R(InRange)`.
    pub label: String,
    /// Draw timestamp; rows must be fed in ascending order per patient.
    pub drawn_at: NaiveDateTime,
}

impl LabResult {
    pub fn new(patient: impl Into<EntityId>, label: impl Into<String>, drawn_at: NaiveDateTime) -> Self {
        LabResult {
            patient: patient.into(),
            label: label.into(),
            drawn_at,
        }
    }
}

/// Per-(patient, window) state for repeat analysis.
#[derive(Debug, Clone, Default)]
pub struct RepeatState {
    /// True while the last abnormal event is within the window.
    pub prior_history: bool,
}

/// Hook set counting consecutive normal results per window.
#[derive(Debug, Clone)]
pub struct RepeatNormals {
    normal_marker: String,
}

impl Default for RepeatNormals {
    fn default() -> Self {
        Self::new("InRange")
    }
}

impl RepeatNormals {
    /// `normal_marker` is the substring identifying a normal result label.
    pub fn new(normal_marker: impl Into<String>) -> Self {
        RepeatNormals {
            normal_marker: normal_marker.into(),
        }
    }

    fn within_window(&self, window: u32, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        day_difference(from, to) < i64::from(window)
    }
}

impl QueueHooks for RepeatNormals {
    type Row = LabResult;
    type Group = EntityId;
    type Key = StatKey;
    type State = RepeatState;

    fn group_key(&self, row: &LabResult) -> EntityId {
        row.patient.clone()
    }

    fn initial_state(&self) -> RepeatState {
        RepeatState::default()
    }

    fn should_evict(&self, window: u32, head: &LabResult, row: &LabResult) -> bool {
        !self.within_window(window, head.drawn_at, row.drawn_at)
    }

    fn on_sentinel(
        &self,
        window: u32,
        state: &mut RepeatState,
        sentinel: &LabResult,
        row: &LabResult,
    ) {
        state.prior_history = self.within_window(window, sentinel.drawn_at, row.drawn_at);
    }

    fn on_emptied(&self, _window: u32, state: &mut RepeatState, _row: &LabResult) {
        state.prior_history = false;
    }

    fn admit(
        &self,
        _window: u32,
        _queue: &SlidingQueue<LabResult>,
        _state: &RepeatState,
        row: &LabResult,
    ) -> bool {
        row.label.contains(&self.normal_marker)
    }

    fn clear_after(
        &self,
        _window: u32,
        _queue: &SlidingQueue<LabResult>,
        _state: &RepeatState,
        _row: &LabResult,
        row_added: bool,
    ) -> ClearMode {
        if row_added {
            ClearMode::Keep
        } else {
            ClearMode::ToSentinel
        }
    }

    fn emit(
        &self,
        window: u32,
        queue: &SlidingQueue<LabResult>,
        state: &RepeatState,
        row_added: bool,
    ) -> (StatKey, u64) {
        let run = if state.prior_history && queue.has_sentinel() {
            None
        } else {
            let preceding = queue.normal_len() - usize::from(row_added);
            Some(preceding as u32)
        };
        (StatKey::new(window, run), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SequenceAnalyzer;
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn runs_for(rows: Vec<LabResult>, window: u32) -> Vec<Option<u32>> {
        let analyzer = SequenceAnalyzer::new(RepeatNormals::default());
        analyzer
            .run(rows, &[window])
            .unwrap()
            .map(|e| e.key.run)
            .collect()
    }

    #[test]
    fn test_normal_run_counts_predecessors() {
        let rows = vec![
            LabResult::new(1, "11210R(InRange)", dt(2012, 9, 10, 7, 0)),
            LabResult::new(1, "11210R(InRange)", dt(2012, 9, 12, 7, 0)),
            LabResult::new(1, "11210R(InRange)", dt(2012, 9, 14, 7, 0)),
        ];
        assert_eq!(runs_for(rows, 30), vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_eviction_is_strict_at_window_boundary() {
        // 4 days and 1 hour apart: the head is stale for window 4, within
        // window 5.
        let rows = || {
            vec![
                LabResult::new(1, "x(InRange)", dt(2013, 5, 1, 6, 55)),
                LabResult::new(1, "x(InRange)", dt(2013, 5, 5, 8, 5)),
            ]
        };
        assert_eq!(runs_for(rows(), 4), vec![Some(0), Some(0)]);
        assert_eq!(runs_for(rows(), 5), vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_abnormal_row_clears_to_sentinel() {
        let rows = vec![
            LabResult::new(1, "x(Result)", dt(2012, 3, 16, 14, 24)),
            LabResult::new(1, "x(InRange)", dt(2012, 3, 24, 8, 2)),
        ];
        // Gap is 7 whole days: inside window 30, the abnormal event
        // contaminates history; outside window 4 it does not.
        assert_eq!(runs_for(rows.clone(), 30), vec![Some(0), None]);
        assert_eq!(runs_for(rows, 4), vec![Some(0), Some(0)]);
    }

    #[test]
    fn test_sentinel_recency_is_strict() {
        // Exactly 7 whole days (7d 17h truncated): stale for window 7.
        let rows = vec![
            LabResult::new(1, "x(Result)", dt(2012, 3, 16, 14, 24)),
            LabResult::new(1, "x(InRange)", dt(2012, 3, 24, 8, 2)),
        ];
        assert_eq!(runs_for(rows.clone(), 7), vec![Some(0), Some(0)]);
        assert_eq!(runs_for(rows, 8), vec![Some(0), None]);
    }

    #[test]
    fn test_run_resumes_after_sentinel_ages_out() {
        // Abnormal, a normal two days on (contaminated), a normal six days
        // on: the sentinel has aged out of window 5 but the first normal
        // has not, so the run resumes at length one.
        let rows = vec![
            LabResult::new(1, "x(High)", dt(2012, 1, 1, 8, 0)),
            LabResult::new(1, "x(InRange)", dt(2012, 1, 3, 8, 0)),
            LabResult::new(1, "x(InRange)", dt(2012, 1, 7, 8, 0)),
        ];
        assert_eq!(runs_for(rows, 5), vec![Some(0), None, Some(1)]);
    }

    #[test]
    fn test_high_and_result_flags_are_abnormal() {
        let rows = vec![
            LabResult::new(1, "x(High)", dt(2012, 1, 1, 8, 0)),
            LabResult::new(1, "x(Result)", dt(2012, 1, 2, 8, 0)),
        ];
        let analyzer = SequenceAnalyzer::new(RepeatNormals::default());
        let admitted: Vec<bool> = analyzer
            .run(rows, &[30])
            .unwrap()
            .map(|e| e.row_added)
            .collect();
        assert_eq!(admitted, vec![false, false]);
    }

    #[test]
    fn test_custom_normal_marker() {
        let hooks = RepeatNormals::new("Normal");
        let analyzer = SequenceAnalyzer::new(hooks);
        let rows = vec![LabResult::new(1, "k(Normal)", dt(2012, 1, 1, 8, 0))];
        let admitted: Vec<bool> = analyzer
            .run(rows, &[30])
            .unwrap()
            .map(|e| e.row_added)
            .collect();
        assert_eq!(admitted, vec![true]);
    }
}
