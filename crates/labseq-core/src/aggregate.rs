//! Emission folding into statistic tables.
//!
//! Reduces the engine's emission stream into mappings from statistic key
//! to running `[total, admitted]` counts, either per entity group or
//! globally across groups.
//!
//! The `(window, None)` key is the per-window denominator: every emission
//! increments it, so its total equals the number of rows processed for
//! that window. An emission carrying a defined run count additionally
//! increments its own `(window, Some(n))` bucket.

use crate::engine::Emission;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Statistic key: window size in days plus the consecutive-normal count.
///
/// `run == None` identifies the per-window denominator (also the key
/// emitted for rows whose history is contaminated by a recent abnormal
/// event; see `repeats`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct StatKey {
    pub window_days: u32,
    pub run: Option<u32>,
}

impl StatKey {
    pub fn new(window_days: u32, run: Option<u32>) -> Self {
        StatKey { window_days, run }
    }

    /// The denominator key for this key's window.
    pub fn denominator(&self) -> Self {
        StatKey {
            window_days: self.window_days,
            run: None,
        }
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.run {
            Some(n) => write!(f, "({}, {})", self.window_days, n),
            None => write!(f, "({}, None)", self.window_days),
        }
    }
}

/// Running `[total, admitted]` pair for one statistic key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub total: u64,
    pub admitted: u64,
}

impl Tally {
    fn observe(&mut self, value: u64, row_added: bool) {
        self.total += value;
        if row_added {
            self.admitted += value;
        }
    }
}

/// Statistic table for one scope (one group, or the whole run).
pub type StatTable = BTreeMap<StatKey, Tally>;

fn fold_into(table: &mut StatTable, key: StatKey, value: u64, row_added: bool) {
    table
        .entry(key.denominator())
        .or_default()
        .observe(value, row_added);
    if key.run.is_some() {
        table.entry(key).or_default().observe(value, row_added);
    }
}

/// Fold emissions into a single table spanning all entity groups.
pub fn fold_global<G>(emissions: impl IntoIterator<Item = Emission<G, StatKey>>) -> StatTable {
    let mut table = StatTable::new();
    for e in emissions {
        fold_into(&mut table, e.key, e.value, e.row_added);
    }
    table
}

/// Fold emissions into one table per entity group.
pub fn fold_per_group<G: Ord>(
    emissions: impl IntoIterator<Item = Emission<G, StatKey>>,
) -> BTreeMap<G, StatTable> {
    let mut tables: BTreeMap<G, StatTable> = BTreeMap::new();
    for e in emissions {
        fold_into(
            tables.entry(e.group).or_default(),
            e.key,
            e.value,
            e.row_added,
        );
    }
    tables
}
