//! Event Registrations
//!
//! Listener bookkeeping for event-capable nodes. Listeners are keyed by
//! event type and callback identity, so registering the same callback twice
//! is a no-op and each registration can be removed on its own.

use std::fmt;
use std::rc::Rc;

/// Stable identity of a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(pub usize);

impl CallbackId {
    /// Identity derived from the address of a shared allocation
    pub fn of<T: ?Sized>(rc: &Rc<T>) -> Self {
        CallbackId(Rc::as_ptr(rc) as *const () as usize)
    }
}

/// Event delivered to listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_type: String,
    pub detail: Option<String>,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Listener callback with a stable identity
#[derive(Clone)]
pub struct Callback {
    id: CallbackId,
    handler: Rc<dyn Fn(&Event)>,
}

impl Callback {
    /// Wrap a closure; its identity is the new allocation
    pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
        let handler: Rc<dyn Fn(&Event)> = Rc::new(handler);
        Self {
            id: CallbackId::of(&handler),
            handler,
        }
    }

    /// Wrap a closure that stands in for some other function, reusing that
    /// function's identity
    pub fn with_id(id: CallbackId, handler: impl Fn(&Event) + 'static) -> Self {
        Self {
            id,
            handler: Rc::new(handler),
        }
    }

    pub fn id(&self) -> CallbackId {
        self.id
    }

    /// Invoke the callback
    pub fn call(&self, event: &Event) {
        (self.handler)(event)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&self.id).finish()
    }
}

/// Listener options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ListenerOptions {
    pub capture: bool,
    pub once: bool,
    pub passive: bool,
}

/// One `(type, callback, options)` registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    pub event_type: String,
    pub callback: Callback,
    pub options: ListenerOptions,
}

impl Listener {
    /// Registration key
    pub fn key(&self) -> (&str, CallbackId) {
        (&self.event_type, self.callback.id())
    }
}

/// Registered listeners of one node, in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRegistrations {
    listeners: Vec<Listener>,
}

impl EventRegistrations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Returns `false` when the callback was already
    /// registered for this type; its options are updated in place.
    pub fn add(&mut self, event_type: &str, callback: Callback, options: ListenerOptions) -> bool {
        if let Some(existing) = self
            .listeners
            .iter_mut()
            .find(|l| l.event_type == event_type && l.callback.id() == callback.id())
        {
            existing.options = options;
            return false;
        }
        self.listeners.push(Listener {
            event_type: event_type.to_string(),
            callback,
            options,
        });
        true
    }

    /// Remove one registration
    pub fn remove(&mut self, event_type: &str, id: CallbackId) -> Option<Listener> {
        let index = self
            .listeners
            .iter()
            .position(|l| l.event_type == event_type && l.callback.id() == id)?;
        Some(self.listeners.remove(index))
    }

    /// Look up one registration
    pub fn get(&self, event_type: &str, id: CallbackId) -> Option<&Listener> {
        self.listeners
            .iter()
            .find(|l| l.event_type == event_type && l.callback.id() == id)
    }

    /// Listeners for one event type
    pub fn for_type<'a>(&'a self, event_type: &'a str) -> impl Iterator<Item = &'a Listener> {
        self.listeners.iter().filter(move |l| l.event_type == event_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Listener> {
        self.listeners.iter()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_add_is_idempotent() {
        let cb = Callback::new(|_| {});
        let mut events = EventRegistrations::new();

        assert!(events.add("click", cb.clone(), ListenerOptions::default()));
        assert!(!events.add("click", cb.clone(), ListenerOptions { once: true, ..Default::default() }));

        assert_eq!(events.len(), 1);
        assert!(events.get("click", cb.id()).unwrap().options.once);
    }

    #[test]
    fn test_same_callback_different_types() {
        let cb = Callback::new(|_| {});
        let mut events = EventRegistrations::new();
        events.add("click", cb.clone(), ListenerOptions::default());
        events.add("input", cb.clone(), ListenerOptions::default());

        assert_eq!(events.len(), 2);
        assert!(events.remove("click", cb.id()).is_some());
        assert_eq!(events.len(), 1);
        assert_eq!(events.for_type("input").count(), 1);
    }

    #[test]
    fn test_callback_identity_and_call() {
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let a = Callback::new(move |_| counter.set(counter.get() + 1));
        let b = Callback::new(|_| {});

        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        a.call(&Event::new("click"));
        assert_eq!(hits.get(), 1);
    }
}
