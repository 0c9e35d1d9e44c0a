//! # State Sync
//!
//! Keeps the flat state of a UI component in sync with the browser location
//! and with key-value storage.
//!
//! ## Core Concepts
//!
//! - **State**: a flat, ordered key-value snapshot merged through patches
//! - **Patches**: per-key `Set`, `Delete` or `NoChange` updates; every merge
//!   reports the keys it changed and emits `statechange`
//! - **Location**: URLs and query strings parsed into state, and state
//!   reflected back into URLs
//! - **Storage**: named slots holding state without its URL-positional keys
//!
//! ## Example
//!
//! ```ignore
//! use statesync::{MemoryStorage, StateStore, StatePatch, StaticLocation, StoreConfig};
//! use std::sync::Arc;
//!
//! let location = Arc::new(StaticLocation::new("https://example.com/docs?page=2"));
//! let store = StateStore::new(StoreConfig::default(), location)
//!     .with_storage(Arc::new(MemoryStorage::new()));
//!
//! // Commit the location into the state
//! store.sync_from_url(None, false)?;
//!
//! // Merge a patch
//! let changed = store.update_state(&StatePatch::new().set("page", "3").delete("draft"), false);
//!
//! // Reflect the state into a URL and persist it
//! let href = store.reflect_state_in_url(None, None)?.href;
//! store.save_state("alice", None, None)?;
//! ```

pub mod codec;
pub mod error;
pub mod location;
pub mod navigation;
pub mod state;
pub mod storage;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use codec::{ParsedUrl, QueryMap, UrlOverlay};
pub use error::{Result, StateError};
pub use location::{Location, StaticLocation};
pub use navigation::{NavigationBridge, NavigationEvent, NavigationMode, NavigationOutcome};
pub use state::{apply_patch, merge_into};
pub use storage::{FileStorage, LoadOutcome, MemoryStorage, StorageBackend};
pub use store::{StateStore, StoreConfig};
pub use subscriptions::{
    DropReason, StateChangeEvent, StoreEvent, SubscriptionConfig, SubscriptionHandle,
    SubscriptionId, SubscriptionManager, STATE_CHANGE_EVENT,
};
pub use types::*;
