//! Patch application and change detection.

use crate::types::{Change, ChangeSet, State, StatePatch, Update};

/// Apply a patch to a state, returning what changed.
///
/// Keys are visited in patch order. `Set` records a change only when the
/// new value differs from the current one under strict equality. `Delete`
/// records a change only when the key was present. `NoChange` never touches
/// the state.
pub fn apply_patch(state: &mut State, patch: &StatePatch) -> ChangeSet {
    let mut changed = ChangeSet::new();

    for (key, update) in patch.iter() {
        match update {
            Update::Set(value) => {
                if state.get(key) != Some(value) {
                    changed.insert(key.clone(), Change::Set(value.clone()));
                    state.insert(key.clone(), value.clone());
                }
            }
            Update::Delete => {
                if state.shift_remove(key).is_some() {
                    changed.insert(key.clone(), Change::Deleted);
                }
            }
            Update::NoChange => {}
        }
    }

    changed
}

/// Merge into an optional state, creating it on first write.
///
/// The first write makes the state exactly the patch's `Set` entries, and
/// those entries are the change set.
pub fn merge_into(state: &mut Option<State>, patch: &StatePatch) -> ChangeSet {
    let current = state.get_or_insert_with(State::new);
    apply_patch(current, patch)
}
