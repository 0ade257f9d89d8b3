use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::sse::EventSourceEvent;

/// An event handler. Equality is identity, like a JS function reference.
#[derive(Clone)]
pub struct EventListener(Rc<dyn Fn(&EventSourceEvent)>);

impl EventListener {
    pub fn new(listener: impl Fn(&EventSourceEvent) + 'static) -> Self {
        Self(Rc::new(listener))
    }

    pub fn call(&self, event: &EventSourceEvent) {
        (self.0)(event)
    }
}

impl PartialEq for EventListener {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl Eq for EventListener {}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventListener")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Ordered `(event type, listener)` registrations of one event source.
#[derive(Default)]
pub struct ListenerRegistry {
    entries: RefCell<Vec<(String, EventListener)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; returns `false` if it was already registered
    /// for this type.
    pub fn add(&self, event_type: &str, listener: &EventListener) -> bool {
        let mut entries = self.entries.borrow_mut();
        if entries
            .iter()
            .any(|(ty, existing)| ty == event_type && existing == listener)
        {
            return false;
        }
        entries.push((event_type.to_owned(), listener.clone()));
        true
    }

    pub fn remove(&self, event_type: &str, listener: &EventListener) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(ty, existing)| !(ty == event_type && existing == listener));
        entries.len() != before
    }

    /// Invoke every listener of `event.event_type` in registration order.
    ///
    /// Listeners may add or remove registrations while running; a listener
    /// removed before its turn is skipped. Returns how many ran.
    pub fn dispatch(&self, event: &EventSourceEvent) -> usize {
        let snapshot: Vec<EventListener> = self
            .entries
            .borrow()
            .iter()
            .filter(|(ty, _)| *ty == event.event_type)
            .map(|(_, listener)| listener.clone())
            .collect();

        let mut invoked = 0;
        for listener in snapshot {
            if !self.contains(&event.event_type, &listener) {
                continue;
            }
            listener.call(event);
            invoked += 1;
        }
        invoked
    }

    pub fn contains(&self, event_type: &str, listener: &EventListener) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|(ty, existing)| ty == event_type && existing == listener)
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(ty, _)| ty == event_type)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting() -> (Rc<Cell<usize>>, EventListener) {
        let calls = Rc::new(Cell::new(0));
        let listener = {
            let calls = calls.clone();
            EventListener::new(move |_| calls.set(calls.get() + 1))
        };
        (calls, listener)
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let registry = ListenerRegistry::new();
        let (calls, listener) = counting();

        assert!(registry.add("message", &listener));
        assert!(!registry.add("message", &listener));
        assert!(registry.add("ping", &listener));

        registry.dispatch(&EventSourceEvent::message("hi"));
        assert_eq!(calls.get(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn dispatch_only_matches_type() {
        let registry = ListenerRegistry::new();
        let (calls, listener) = counting();
        registry.add("ping", &listener);

        assert_eq!(registry.dispatch(&EventSourceEvent::message("hi")), 0);
        assert_eq!(registry.dispatch(&EventSourceEvent::new("ping", "")), 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn remove_requires_same_listener() {
        let registry = ListenerRegistry::new();
        let (_, first) = counting();
        let (_, second) = counting();
        registry.add("message", &first);

        assert!(!registry.remove("message", &second));
        assert!(!registry.remove("ping", &first));
        assert!(registry.remove("message", &first));
        assert!(registry.is_empty());
    }

    #[test]
    fn listener_removed_during_dispatch_is_skipped() {
        let registry = Rc::new(ListenerRegistry::new());
        let (second_calls, second) = counting();
        let first = {
            let registry = registry.clone();
            let second = second.clone();
            EventListener::new(move |_| {
                registry.remove("message", &second);
            })
        };
        registry.add("message", &first);
        registry.add("message", &second);

        assert_eq!(registry.dispatch(&EventSourceEvent::message("x")), 1);
        assert_eq!(second_calls.get(), 0);
    }
}
