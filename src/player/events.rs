//! Event fan-out to view-model subscribers

use super::PlayerEvent;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Callback = Arc<dyn Fn(&PlayerEvent) + Send + Sync>;
type Subscribers = RwLock<Vec<(u64, Callback)>>;

/// Event dispatcher
pub(crate) struct EventDispatcher {
    subscribers: Arc<Subscribers>,
    next_id: AtomicU64,
}

impl EventDispatcher {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn subscribe<F>(&self, callback: F) -> EventSubscription
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().push((id, Arc::new(callback)));

        EventSubscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Call every subscriber; callbacks run without the list locked so they
    /// may subscribe or unsubscribe
    pub(crate) fn dispatch(&self, event: &PlayerEvent) {
        let callbacks: Vec<Callback> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

/// Event subscription handle
///
/// The callback stays registered for as long as this handle lives.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct EventSubscription {
    id: u64,
    subscribers: Weak<Subscribers>,
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.write().retain(|(id, _)| *id != self.id);
        }
    }
}
