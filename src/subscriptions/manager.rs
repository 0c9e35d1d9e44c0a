//! Subscription manager for broadcasting state changes.

use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

use super::types::{
    DropReason, StateChangeEvent, StoreEvent, SubscriptionConfig, SubscriptionHandle,
    SubscriptionId,
};

type Callback = Arc<dyn Fn(&StateChangeEvent) + Send + Sync>;

/// Where a subscription's events go.
#[derive(Clone)]
enum Sink {
    Callback(Callback),
    Channel(Sender<StoreEvent>),
}

/// Internal subscription state.
#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    sink: Sink,
}

impl Subscription {
    /// Deliver an event. Returns the drop reason if the subscriber can no
    /// longer receive.
    fn deliver(&self, event: &StateChangeEvent) -> Option<DropReason> {
        match &self.sink {
            Sink::Callback(callback) => {
                callback(event);
                None
            }
            Sink::Channel(sender) => match sender.try_send(StoreEvent::StateChange(event.clone())) {
                Ok(()) => None,
                Err(TrySendError::Full(_)) => Some(DropReason::BufferOverflow),
                Err(TrySendError::Disconnected(_)) => Some(DropReason::Disconnected),
            },
        }
    }

    fn notify_dropped(&self, reason: DropReason) {
        if let Sink::Channel(sender) = &self.sink {
            // Best effort: the buffer may still be full.
            let _ = sender.try_send(StoreEvent::Dropped { reason });
        }
    }
}

/// Manages subscriptions and fans out state changes.
///
/// Subscribers are notified synchronously in registration order. The
/// subscriber list is snapshotted before delivery and no lock is held while
/// callbacks run, so a callback may subscribe, unsubscribe or merge more
/// state.
pub struct SubscriptionManager {
    /// Active subscriptions in registration order.
    subscriptions: RwLock<Vec<Subscription>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

impl SubscriptionManager {
    /// Create a new subscription manager.
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn register(&self, sink: Sink) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscriptions.write().push(Subscription { id, sink });
        id
    }

    /// Register a callback observer.
    pub fn subscribe_callback<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChangeEvent) + Send + Sync + 'static,
    {
        self.register(Sink::Callback(Arc::new(callback)))
    }

    /// Create a channel subscription with a bounded buffer.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        let (sender, receiver) = bounded(config.buffer_size.max(1));
        let id = self.register(Sink::Channel(sender));
        SubscriptionHandle { id, receiver }
    }

    /// Unsubscribe and clean up. Returns false for an unknown ID.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = {
            let mut subs = self.subscriptions.write();
            let idx = subs.iter().position(|sub| sub.id == id);
            idx.map(|idx| subs.remove(idx))
        };

        match removed {
            Some(sub) => {
                sub.notify_dropped(DropReason::Unsubscribed);
                true
            }
            None => false,
        }
    }

    /// Get subscription count.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Deliver a state change to every current subscriber. Channel
    /// subscribers that cannot accept the event are dropped.
    pub fn broadcast_state_change(&self, event: &StateChangeEvent) {
        let subs: Vec<Subscription> = self.subscriptions.read().clone();
        trace!(subscribers = subs.len(), changed = event.changed.len(), "broadcasting statechange");

        let mut to_remove = Vec::new();
        for sub in &subs {
            if let Some(reason) = sub.deliver(event) {
                to_remove.push((sub.id, reason));
            }
        }

        if !to_remove.is_empty() {
            let mut subs = self.subscriptions.write();
            for (id, reason) in to_remove {
                let idx = subs.iter().position(|sub| sub.id == id);
                if let Some(idx) = idx {
                    let sub = subs.remove(idx);
                    warn!(subscription = id.0, ?reason, "dropping subscriber");
                    sub.notify_dropped(reason);
                }
            }
        }
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}
