//! State merging.
//!
//! A merge applies a [`StatePatch`](crate::types::StatePatch) to a flat
//! state and reports the keys whose effective value changed.

mod merge;

pub use merge::{apply_patch, merge_into};
