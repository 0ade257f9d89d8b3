//! Server-Sent Events connection primitive
//!
//! An `EventSource` modelled on the browser object: a URL, a credentials
//! flag, a ready state, named listeners and `close()`. The native
//! implementation streams `text/event-stream` over reqwest on a shared
//! Tokio runtime; signals are pushed back to the host thread and delivered
//! by `NativeEventSourceFactory::dispatch_pending`.

mod config;
mod error;
mod event;
mod listeners;
mod manager;
mod native;

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

pub use config::NativeEventSourceConfig;
pub use error::EventSourceError;
pub use event::{ERROR, EventSourceEvent, MESSAGE, OPEN};
pub use listeners::{EventListener, ListenerRegistry};
pub use manager::{EventSourceManager, Signal, SignalKind};
pub use native::{NativeEventSource, NativeEventSourceFactory};

/// Connection state of an event source (matching the browser API).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    #[default]
    Connecting,
    Open,
    Closed,
}

/// Options passed to an event source constructor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventSourceInit {
    pub with_credentials: bool,
}

/// A streaming connection as seen by the binding layer.
pub trait EventSource {
    fn url(&self) -> &str;

    fn with_credentials(&self) -> bool;

    fn ready_state(&self) -> ReadyState;

    /// Attach `listener` to `event_type`. Attaching the same listener twice
    /// for one type has no effect.
    fn add_event_listener(&self, event_type: &str, listener: &EventListener);

    fn remove_event_listener(&self, event_type: &str, listener: &EventListener);

    /// Stop the connection. No listener is invoked afterwards.
    fn close(&self);
}

/// Shared handle to one live connection. Equality is identity.
#[derive(Clone)]
pub struct EventSourceHandle(Rc<dyn EventSource>);

impl EventSourceHandle {
    pub fn new<E: EventSource + 'static>(source: Rc<E>) -> Self {
        Self(source)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl Deref for EventSourceHandle {
    type Target = dyn EventSource;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for EventSourceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EventSourceHandle {}

impl fmt::Debug for EventSourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSourceHandle")
            .field("url", &self.0.url())
            .field("ready_state", &self.0.ready_state())
            .finish()
    }
}

type ConstructFn = dyn Fn(&str, &EventSourceInit) -> EventSourceHandle;

/// Capability to open event sources. Equality is identity, so a
/// constructor only counts as changed when a different one is passed.
#[derive(Clone)]
pub struct EventSourceConstructor(Rc<ConstructFn>);

impl EventSourceConstructor {
    pub fn new(construct: impl Fn(&str, &EventSourceInit) -> EventSourceHandle + 'static) -> Self {
        Self(Rc::new(construct))
    }

    pub fn construct(&self, url: &str, init: &EventSourceInit) -> EventSourceHandle {
        (self.0)(url, init)
    }
}

impl PartialEq for EventSourceConstructor {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl Eq for EventSourceConstructor {}

impl fmt::Debug for EventSourceConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventSourceConstructor")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

thread_local! {
    static DEFAULT_CONSTRUCTOR: RefCell<Option<EventSourceConstructor>> = const { RefCell::new(None) };
}

/// The constructor used when none is passed: the thread's native factory
/// unless another one was installed with [`set_default_constructor`].
pub fn default_constructor() -> EventSourceConstructor {
    DEFAULT_CONSTRUCTOR.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| NativeEventSourceFactory::thread_default().constructor())
            .clone()
    })
}

/// Install the constructor used when none is passed, returning the
/// previous one.
pub fn set_default_constructor(constructor: EventSourceConstructor) -> Option<EventSourceConstructor> {
    DEFAULT_CONSTRUCTOR.with(|slot| slot.borrow_mut().replace(constructor))
}

/// Deliver pending network signals to the native sources of this thread.
pub fn dispatch_pending() -> usize {
    NativeEventSourceFactory::thread_default().dispatch_pending()
}
