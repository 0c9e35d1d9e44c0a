//! Main Store struct tying all components together.

use crate::codec::{self, ParsedUrl, QueryMap, UrlOverlay};
use crate::error::{Result, StateError};
use crate::location::Location;
use crate::state::merge_into;
use crate::storage::{snapshot, LoadOutcome, StorageBackend};
use crate::subscriptions::{
    StateChangeEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
    SubscriptionManager,
};
use crate::types::{
    ChangeSet, ExclusionList, State, StatePatch, StateValue, HASH_KEY, PATHNAME_KEY,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Store configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Keys never written to storage.
    pub persist_exclude: ExclusionList,

    /// Keys never written to the URL query string.
    pub url_exclude: ExclusionList,

    /// Buffer size for channel subscriptions.
    pub subscription_buffer_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            persist_exclude: ExclusionList::default(),
            url_exclude: ExclusionList::default(),
            subscription_buffer_size: SubscriptionConfig::default().buffer_size,
        }
    }
}

/// State of one component, kept in sync with the location and storage.
///
/// Provides a unified interface for:
/// - Merging patches into the state and notifying subscribers
/// - Parsing the location into a URL and query map
/// - Reflecting state into a URL
/// - Saving and restoring state slots
pub struct StateStore {
    /// Store configuration.
    config: StoreConfig,

    /// Current document location.
    location: Arc<dyn Location>,

    /// Storage backend, if any.
    storage: Option<Arc<dyn StorageBackend>>,

    /// Current state. `None` until the first merge.
    state: RwLock<Option<State>>,

    /// Last parsed URL.
    url: RwLock<Option<ParsedUrl>>,

    /// Last parsed query.
    query: RwLock<Option<QueryMap>>,

    /// `statechange` subscribers.
    subscriptions: SubscriptionManager,
}

impl StateStore {
    /// Create a store without storage.
    pub fn new(config: StoreConfig, location: Arc<dyn Location>) -> Self {
        Self {
            config,
            location,
            storage: None,
            state: RwLock::new(None),
            url: RwLock::new(None),
            query: RwLock::new(None),
            subscriptions: SubscriptionManager::new(),
        }
    }

    /// Attach a storage backend.
    pub fn with_storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // --- State ---

    /// Snapshot of the current state. `None` before the first merge.
    pub fn state(&self) -> Option<State> {
        self.state.read().clone()
    }

    /// Current value of one key.
    pub fn get(&self, key: &str) -> Option<StateValue> {
        self.state.read().as_ref().and_then(|s| s.get(key).cloned())
    }

    /// Merge a patch into the state and emit `statechange`.
    ///
    /// Subscribers run after the state lock is released, in registration
    /// order, with a snapshot of the merged state. An event is emitted even
    /// when nothing changed.
    pub fn update_state(&self, patch: &StatePatch, suppress_persist: bool) -> ChangeSet {
        let (changed, new_state) = {
            let mut state = self.state.write();
            let changed = merge_into(&mut state, patch);
            (changed, state.clone().unwrap_or_default())
        };

        debug!(
            patched = patch.len(),
            changed = changed.len(),
            suppress_persist,
            "merged state"
        );

        let event = StateChangeEvent {
            new_state,
            changed,
            suppress_persist,
        };
        self.subscriptions.broadcast_state_change(&event);

        event.changed
    }

    // --- URL ---

    /// The href relative URLs resolve against.
    pub fn location_href(&self) -> String {
        self.location.href()
    }

    /// Last parsed URL.
    pub fn url(&self) -> Option<ParsedUrl> {
        self.url.read().clone()
    }

    /// Last parsed query.
    pub fn query(&self) -> Option<QueryMap> {
        self.query.read().clone()
    }

    /// Parse a URL against the current location and cache it.
    pub fn parse_url(&self, url: &str) -> Result<ParsedUrl> {
        let parsed = codec::url::parse(url, &self.location.href())?;
        *self.url.write() = Some(parsed.clone());
        Ok(parsed)
    }

    /// Parse a query string and cache it. An empty query clears the cache.
    pub fn parse_query(&self, query: Option<&str>) -> Result<Option<QueryMap>> {
        let parsed = codec::query::parse(query)?;
        *self.query.write() = parsed.clone();
        Ok(parsed)
    }

    /// The state implied by the cached URL: `hash`, `pathname` and every
    /// query parameter. Query parameters win on collision.
    pub fn reflect_state(&self) -> Result<State> {
        let url = self.url().ok_or(StateError::UrlNotParsed)?;

        let mut params = State::new();
        params.insert(HASH_KEY.to_string(), StateValue::from(url.hash.as_str()));
        params.insert(
            PATHNAME_KEY.to_string(),
            StateValue::from(url.pathname.as_str()),
        );

        if let Some(query) = self.query() {
            for (key, value) in &query {
                params.insert(key.clone(), StateValue::from(value.as_str()));
            }
        }
        Ok(params)
    }

    /// Parse `url` (or the current location) and return the reflected
    /// state. The state itself is not touched; see [`Self::sync_from_url`].
    ///
    /// An empty `url` means the current location. The cached URL and query
    /// are replaced together, and only when both parse.
    pub fn update_url(&self, url: Option<&str>) -> Result<State> {
        let base = self.location.href();
        let href = url.filter(|url| !url.is_empty()).unwrap_or(&base);

        let parsed = codec::url::parse(href, &base)?;
        let query = codec::query::parse(Some(&parsed.search))?;
        trace!(href = %parsed.href, "updated url");

        *self.url.write() = Some(parsed);
        *self.query.write() = query;
        self.reflect_state()
    }

    /// Parse `url` (or the current location) and merge the reflected state.
    pub fn sync_from_url(&self, url: Option<&str>, suppress_persist: bool) -> Result<ChangeSet> {
        let reflected = self.update_url(url)?;
        Ok(self.update_state(&StatePatch::from(reflected), suppress_persist))
    }

    /// Build the URL reflecting `state` (or the current state).
    ///
    /// `exclude` defaults to the configured URL exclusions; excluded keys
    /// never reach the query string.
    pub fn reflect_state_in_url(
        &self,
        state: Option<&State>,
        exclude: Option<&ExclusionList>,
    ) -> Result<ParsedUrl> {
        let current;
        let state = match state {
            Some(state) => state,
            None => {
                current = self.state().unwrap_or_default();
                &current
            }
        };
        let exclude = exclude.unwrap_or(&self.config.url_exclude);
        codec::url::serialize(state, exclude, &self.location.href())
    }

    /// Turn an overlay (or the cached URL) into an href.
    pub fn join_url(&self, overlay: Option<&UrlOverlay>) -> Result<String> {
        let base = self.location.href();
        match overlay {
            Some(overlay) => codec::url::join(overlay, &base),
            None => {
                let url = self.url().ok_or(StateError::UrlNotParsed)?;
                codec::url::join(&UrlOverlay::from(&url), &base)
            }
        }
    }

    // --- Persistence ---

    fn available_storage(&self) -> Option<&Arc<dyn StorageBackend>> {
        let storage = self.storage.as_ref().filter(|s| s.is_available());
        if storage.is_none() {
            debug!("storage unavailable");
        }
        storage
    }

    /// Save `state` (or the current state) under `slot`.
    ///
    /// Returns `Ok(false)` without writing when storage is unavailable.
    /// `exclude` defaults to the configured persistence exclusions.
    pub fn save_state(
        &self,
        slot: &str,
        state: Option<&State>,
        exclude: Option<&ExclusionList>,
    ) -> Result<bool> {
        let Some(storage) = self.available_storage() else {
            return Ok(false);
        };

        let exclude = exclude.unwrap_or(&self.config.persist_exclude);
        let encoded = match state {
            Some(state) => snapshot::encode(state, exclude)?,
            None => snapshot::encode(&self.state().unwrap_or_default(), exclude)?,
        };

        storage.set_item(slot, &encoded)?;
        debug!(slot, bytes = encoded.len(), "saved state");
        Ok(true)
    }

    /// Restore the slot into the state through [`Self::update_state`].
    ///
    /// A missing or empty slot leaves the state alone and emits nothing.
    pub fn load_state(&self, slot: &str) -> Result<LoadOutcome> {
        let Some(storage) = self.available_storage() else {
            return Ok(LoadOutcome::Unavailable);
        };

        let raw = match storage.get_item(slot)? {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                debug!(slot, "nothing stored");
                return Ok(LoadOutcome::Missing);
            }
        };

        let patch = snapshot::decode(&raw).map_err(|e| {
            warn!(slot, error = %e, "stored state is unreadable");
            e
        })?;

        let changed = self.update_state(&patch, false);
        debug!(slot, changed = changed.len(), "loaded state");
        Ok(LoadOutcome::Restored(changed))
    }

    /// Remove a slot. Returns `Ok(false)` when storage is unavailable.
    pub fn delete_state(&self, slot: &str) -> Result<bool> {
        let Some(storage) = self.available_storage() else {
            return Ok(false);
        };
        storage.remove_item(slot)?;
        debug!(slot, "deleted state");
        Ok(true)
    }

    // --- Subscriptions ---

    /// Register a `statechange` callback.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChangeEvent) + Send + Sync + 'static,
    {
        self.subscriptions.subscribe_callback(callback)
    }

    /// Open a channel subscription sized by the configuration.
    pub fn subscribe_channel(&self) -> SubscriptionHandle {
        self.subscriptions.subscribe(SubscriptionConfig {
            buffer_size: self.config.subscription_buffer_size,
        })
    }

    /// Remove a subscription. Returns false for an unknown ID.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscriptions.unsubscribe(id)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.subscription_count()
    }
}
