//! Labseq common types and helpers.
//!
//! This crate provides the foundational pieces shared across labseq crates:
//! - Entity identifiers used as grouping keys
//! - Whole-day and epoch time helpers
//! - The unified error type

pub mod error;
pub mod id;
pub mod time;

pub use error::{Error, ErrorCategory, Result};
pub use id::EntityId;
