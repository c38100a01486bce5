use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{Envelope, EventKind};

/// Outcome of a single listener invocation. An `Err` is logged and isolated;
/// it never stops delivery to the remaining listeners.
pub type ListenerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Listener = Arc<dyn Fn(&Envelope) -> ListenerResult + Send + Sync>;

/// Handle returned by `subscribe`; pass it back to `unsubscribe` to
/// deregister. Unsubscribing twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    kind: EventKind,
    id: u64,
}

/// A registered listener paired with its subscription id
#[derive(Clone)]
pub struct RegisteredListener {
    id: u64,
    callback: Listener,
}

/// Routes inbound envelopes to subscribers by event kind.
///
/// Delivery order equals subscription order.
pub struct ListenerRegistry {
    listeners: HashMap<EventKind, Vec<RegisteredListener>>,
    next_id: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&Envelope) -> ListenerResult + Send + Sync + 'static,
    {
        self.next_id += 1;
        let id = self.next_id;
        self.listeners.entry(kind).or_default().push(RegisteredListener {
            id,
            callback: Arc::new(callback),
        });
        Subscription { kind, id }
    }

    /// Removes the listener behind the handle. Safe to call more than once.
    pub fn unsubscribe(&mut self, subscription: &Subscription) {
        if let Some(list) = self.listeners.get_mut(&subscription.kind) {
            list.retain(|listener| listener.id != subscription.id);
        }
    }

    /// Listeners for a kind, in subscription order. Cloned out so callers can
    /// invoke them without holding a lock on the registry.
    pub fn snapshot(&self, kind: EventKind) -> Vec<RegisteredListener> {
        self.listeners.get(&kind).cloned().unwrap_or_default()
    }

    /// Invokes every listener in order. A failing listener is logged and does
    /// not stop delivery to the rest.
    pub fn deliver(listeners: &[RegisteredListener], envelope: &Envelope) {
        for listener in listeners {
            if let Err(e) = (listener.callback)(envelope) {
                tracing::warn!(
                    "Listener {} for '{}' failed: {}",
                    listener.id,
                    envelope.kind(),
                    e
                );
            }
        }
    }

    /// Routes one envelope to all subscribers registered for its kind
    pub fn dispatch(&self, envelope: &Envelope) {
        Self::deliver(&self.snapshot(envelope.kind()), envelope);
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventPayload, MessageBody, ContentType, TypingBody};
    use std::sync::Mutex;

    fn message(content: &str) -> Envelope {
        Envelope::new(EventPayload::Message(MessageBody {
            content: content.to_string(),
            content_type: ContentType::Text,
        }))
    }

    #[test]
    fn test_delivery_follows_subscription_order() {
        let mut registry = ListenerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            registry.subscribe(EventKind::Message, move |_| {
                seen.lock().unwrap().push(tag);
                Ok(())
            });
        }

        registry.dispatch(&message("hi"));
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribed_listener_is_never_invoked() {
        let mut registry = ListenerRegistry::new();
        let seen = Arc::new(Mutex::new(0u32));

        let seen_cb = Arc::clone(&seen);
        let subscription = registry.subscribe(EventKind::Message, move |_| {
            *seen_cb.lock().unwrap() += 1;
            Ok(())
        });

        registry.unsubscribe(&subscription);
        // Double-unsubscribe is a no-op, not an error
        registry.unsubscribe(&subscription);

        registry.dispatch(&message("hi"));
        assert_eq!(*seen.lock().unwrap(), 0);
        assert_eq!(registry.listener_count(EventKind::Message), 0);
    }

    #[test]
    fn test_failing_listener_does_not_block_later_subscribers() {
        let mut registry = ListenerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        registry.subscribe(EventKind::Message, |_| Err("listener exploded".into()));

        let seen_cb = Arc::clone(&seen);
        registry.subscribe(EventKind::Message, move |envelope| {
            if let EventPayload::Message(body) = envelope.payload() {
                seen_cb.lock().unwrap().push(body.content.clone());
            }
            Ok(())
        });

        registry.dispatch(&message("still delivered"));
        assert_eq!(*seen.lock().unwrap(), vec!["still delivered"]);
    }

    #[test]
    fn test_dispatch_only_reaches_matching_kind() {
        let mut registry = ListenerRegistry::new();
        let seen = Arc::new(Mutex::new(0u32));

        let seen_cb = Arc::clone(&seen);
        registry.subscribe(EventKind::Typing, move |_| {
            *seen_cb.lock().unwrap() += 1;
            Ok(())
        });

        registry.dispatch(&message("hi"));
        assert_eq!(*seen.lock().unwrap(), 0);

        registry.dispatch(&Envelope::new(EventPayload::Typing(TypingBody {
            is_typing: false,
        })));
        assert_eq!(*seen.lock().unwrap(), 1);
    }
}
