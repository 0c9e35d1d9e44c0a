//! Encoding of persisted state projections.

use crate::error::{Result, StateError};
use crate::types::{ChangeSet, ExclusionList, State, StatePatch};

/// Result of restoring a slot.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadOutcome {
    /// No usable storage backend.
    Unavailable,
    /// Nothing stored under the slot. The state was not touched.
    Missing,
    /// The slot was merged into the state.
    Restored(ChangeSet),
}

impl LoadOutcome {
    /// The change set, if the slot was restored.
    pub fn changed(&self) -> Option<&ChangeSet> {
        match self {
            LoadOutcome::Restored(changed) => Some(changed),
            _ => None,
        }
    }
}

/// Shallow copy of `state` without the excluded keys.
pub fn project(state: &State, exclude: &ExclusionList) -> State {
    let mut projection = state.clone();
    for key in exclude.iter() {
        projection.shift_remove(key);
    }
    projection
}

/// Encode the projection of `state` as JSON object text.
pub fn encode(state: &State, exclude: &ExclusionList) -> Result<String> {
    serde_json::to_string(&project(state, exclude))
        .map_err(|e| StateError::Serialization(e.to_string()))
}

/// Decode stored JSON object text into a patch. `null` members delete.
pub fn decode(raw: &str) -> Result<StatePatch> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| StateError::Deserialization(e.to_string()))?;
    StatePatch::from_json(value)
}
