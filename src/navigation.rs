//! Wiring between navigation events and a [`StateStore`].
//!
//! The host owns the actual event sources (`hashchange`, `popstate`) and
//! forwards them here. The bridge always reads the current location.

use crate::error::Result;
use crate::store::StateStore;
use crate::types::{ChangeSet, State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A navigation event raised by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationEvent {
    /// The fragment changed.
    HashChange,
    /// The history entry changed.
    PopState,
}

impl NavigationEvent {
    /// The DOM event name.
    pub fn name(&self) -> &'static str {
        match self {
            NavigationEvent::HashChange => "hashchange",
            NavigationEvent::PopState => "popstate",
        }
    }
}

/// What the bridge does with a navigation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    /// Only refresh the cached URL and query.
    #[default]
    ParseOnly,
    /// Also merge the reflected view into the state.
    Commit,
}

/// Result of handling one navigation.
#[derive(Clone, Debug, PartialEq)]
pub enum NavigationOutcome {
    /// The reflected view, not committed.
    Reflected(State),
    /// The reflected view was merged.
    Committed(ChangeSet),
}

/// Drives a store from navigation events.
pub struct NavigationBridge {
    store: Arc<StateStore>,
    mode: NavigationMode,
    /// Passed through to `statechange` when committing.
    suppress_persist: bool,
}

impl NavigationBridge {
    pub fn new(store: Arc<StateStore>, mode: NavigationMode) -> Self {
        Self {
            store,
            mode,
            suppress_persist: false,
        }
    }

    /// Mark committed navigations as not-to-be-persisted.
    pub fn suppress_persist(mut self, suppress: bool) -> Self {
        self.suppress_persist = suppress;
        self
    }

    pub fn mode(&self) -> NavigationMode {
        self.mode
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Handle a navigation event against the current location.
    pub fn handle(&self, event: NavigationEvent) -> Result<NavigationOutcome> {
        debug!(event = event.name(), mode = ?self.mode, "navigation");
        match self.mode {
            NavigationMode::ParseOnly => {
                self.store.update_url(None).map(NavigationOutcome::Reflected)
            }
            NavigationMode::Commit => self
                .store
                .sync_from_url(None, self.suppress_persist)
                .map(NavigationOutcome::Committed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::StaticLocation;
    use crate::store::StoreConfig;
    use crate::types::{Change, StateValue};

    fn setup(mode: NavigationMode) -> (Arc<StaticLocation>, NavigationBridge) {
        let location = Arc::new(StaticLocation::new("https://example.com/start"));
        let store = Arc::new(StateStore::new(StoreConfig::default(), location.clone()));
        (location, NavigationBridge::new(store, mode))
    }

    #[test]
    fn test_parse_only_leaves_state() {
        let (location, bridge) = setup(NavigationMode::ParseOnly);
        location.assign("https://example.com/start#details");

        let outcome = bridge.handle(NavigationEvent::HashChange).unwrap();

        match outcome {
            NavigationOutcome::Reflected(view) => {
                assert_eq!(view["hash"], StateValue::from("#details"));
            }
            other => panic!("Expected Reflected, got {:?}", other),
        }
        assert!(bridge.store().state().is_none());
    }

    #[test]
    fn test_commit_merges_location() {
        let (location, bridge) = setup(NavigationMode::Commit);
        bridge.handle(NavigationEvent::PopState).unwrap();

        location.assign("https://example.com/start?tab=2");
        let outcome = bridge.handle(NavigationEvent::PopState).unwrap();

        let NavigationOutcome::Committed(changed) = outcome else {
            panic!("Expected Committed");
        };
        assert_eq!(changed.len(), 1);
        assert_eq!(changed["tab"], Change::Set(StateValue::from("2")));
    }

    #[test]
    fn test_event_names() {
        assert_eq!(NavigationEvent::HashChange.name(), "hashchange");
        assert_eq!(NavigationEvent::PopState.name(), "popstate");
    }
}
