//! Subscription system for state change notifications.
//!
//! Every merge emits a `statechange` event carrying the new state, the
//! change set and the caller's `suppress_persist` flag. Subscribers are
//! either:
//! - callbacks, run synchronously during the merge call, or
//! - bounded channels, with slow-subscriber dropping.
//!
//! # Example
//!
//! ```ignore
//! let manager = SubscriptionManager::new();
//!
//! let handle = manager.subscribe(SubscriptionConfig::default());
//! manager.subscribe_callback(|event| println!("changed: {:?}", event.changed));
//!
//! loop {
//!     match handle.recv() {
//!         Ok(StoreEvent::StateChange(event)) => println!("{:?}", event.new_state),
//!         Ok(StoreEvent::Dropped { .. }) | Err(_) => break,
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    DropReason, StateChangeEvent, StoreEvent, SubscriptionConfig, SubscriptionHandle,
    SubscriptionId, STATE_CHANGE_EVENT,
};
