//! Labseq core library.
//!
//! Analyzes time-ordered clinical lab-test result sequences per patient to
//! detect runs of consecutive normal results within configurable day
//! windows, and evaluates binary classifier performance on held-out data.
//!
//! The center of the crate is the generic windowed sequence-aggregation
//! engine in [`engine`]: per entity group it maintains a sliding queue of
//! admitted rows, consults a caller-supplied [`engine::QueueHooks`]
//! strategy to evict, admit, clear, and track sentinel state, and emits one
//! keyed statistic per row per window size. [`aggregate`] folds the
//! emission stream into statistic tables, [`repeats`] supplies the clinical
//! "consecutive normal results" hook set, and [`score`] holds the
//! classifier performance scorer.

pub mod aggregate;
pub mod engine;
pub mod repeats;
pub mod score;

pub use labseq_common::{EntityId, Error, Result};
