//! Core entity definitions for Daybook.
//!
//! This crate defines the records persisted by the storage layer: scheduled
//! tasks and user topics.

mod task;
mod topic;

pub use task::*;
pub use topic::*;
