//! In-process publish/subscribe
//!
//! A small mediator decoupling settings mutation from the panels and
//! providers that react to it. Handlers are keyed by message type and by a
//! subscriber name so a component can drop all of its handlers on teardown.
//! Dispatch is synchronous on the publishing thread, in registration order.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Published after the settings document has been saved; subscribers
/// re-read whatever fields they mirror.
pub struct ConfigChanged;

type Handler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

struct Subscription {
    owner: String,
    handler: Handler,
}

/// Routing table of subscriber callbacks keyed by message type. Owns no
/// domain data.
#[derive(Default)]
pub struct EventBus {
    subscriptions: Mutex<HashMap<TypeId, Vec<Subscription>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for messages of type `M`. The same owner may hold
    /// handlers for any number of message types.
    pub fn subscribe<M: Any + Send + Sync>(
        &self,
        owner: &str,
        handler: impl Fn(&M) + Send + Sync + 'static,
    ) {
        let wrapped: Handler = Arc::new(move |message: &dyn Any| {
            if let Some(message) = message.downcast_ref::<M>() {
                handler(message);
            }
        });
        self.subscriptions
            .lock()
            .unwrap()
            .entry(TypeId::of::<M>())
            .or_default()
            .push(Subscription {
                owner: owner.to_string(),
                handler: wrapped,
            });
    }

    /// Remove every handler registered under `owner`, across all message
    /// types. Required on teardown so publishes cannot reach a dropped
    /// component.
    pub fn unsubscribe(&self, owner: &str) {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        for handlers in subscriptions.values_mut() {
            handlers.retain(|s| s.owner != owner);
        }
        subscriptions.retain(|_, handlers| !handlers.is_empty());
    }

    /// Invoke every handler registered for `M`, in registration order.
    /// The handler list is snapshotted before dispatch, so handlers may
    /// subscribe, unsubscribe, or publish again without deadlocking.
    pub fn publish<M: Any + Send + Sync>(&self, message: &M) {
        let handlers: Vec<Handler> = {
            let subscriptions = self.subscriptions.lock().unwrap();
            match subscriptions.get(&TypeId::of::<M>()) {
                Some(handlers) => handlers.iter().map(|s| s.handler.clone()).collect(),
                None => return,
            }
        };
        tracing::trace!(
            message = std::any::type_name::<M>(),
            handlers = handlers.len(),
            "Publishing message"
        );
        for handler in handlers {
            handler(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct VolumeNudged(i32);

    #[test]
    fn routes_by_message_type() {
        let bus = EventBus::new();
        let config_hits = Arc::new(AtomicUsize::new(0));
        let volume_hits = Arc::new(AtomicUsize::new(0));

        let hits = config_hits.clone();
        bus.subscribe::<ConfigChanged>("panel", move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        let hits = volume_hits.clone();
        bus.subscribe::<VolumeNudged>("panel", move |m| {
            assert_eq!(m.0, 5);
            hits.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&ConfigChanged);
        bus.publish(&VolumeNudged(5));
        bus.publish(&ConfigChanged);

        assert_eq!(config_hits.load(Ordering::SeqCst), 2);
        assert_eq!(volume_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispatches_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..4 {
            let order = order.clone();
            bus.subscribe::<ConfigChanged>(&format!("sub-{i}"), move |_| {
                order.lock().unwrap().push(i);
            });
        }

        bus.publish(&ConfigChanged);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn unsubscribe_removes_all_handlers_of_owner() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        bus.subscribe::<ConfigChanged>("panel", move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let h = hits.clone();
        bus.subscribe::<VolumeNudged>("panel", move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let h = hits.clone();
        bus.subscribe::<ConfigChanged>("other", move |_| {
            h.fetch_add(10, Ordering::SeqCst);
        });

        bus.unsubscribe("panel");
        bus.publish(&ConfigChanged);
        bus.publish(&VolumeNudged(1));

        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn handlers_may_publish_reentrantly() {
        let bus = Arc::new(EventBus::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let inner_bus = bus.clone();
        bus.subscribe::<ConfigChanged>("outer", move |_| {
            inner_bus.publish(&VolumeNudged(1));
        });
        let h = hits.clone();
        bus.subscribe::<VolumeNudged>("inner", move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&ConfigChanged);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
