//! Host-thread side of the native event source.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::mpsc::{self, Receiver};

use crate::sse::{
    ERROR, EventListener, EventSource, EventSourceConstructor, EventSourceEvent,
    EventSourceHandle, EventSourceInit, EventSourceManager, ListenerRegistry,
    NativeEventSourceConfig, OPEN, ReadyState, Signal, SignalKind,
};

thread_local! {
    static THREAD_FACTORY: RefCell<Option<Rc<NativeEventSourceFactory>>> = const { RefCell::new(None) };
}

/// Opens native event sources and routes network signals to them.
///
/// Sources are `!Send`; signals are delivered only when the owning thread
/// calls [`dispatch_pending`](Self::dispatch_pending).
pub struct NativeEventSourceFactory {
    manager: EventSourceManager,
    receiver: Receiver<Signal>,
    routes: RefCell<HashMap<u32, Weak<NativeEventSource>>>,
}

impl NativeEventSourceFactory {
    pub fn new(config: NativeEventSourceConfig) -> Rc<Self> {
        let (sender, receiver) = mpsc::channel();
        Rc::new(Self {
            manager: EventSourceManager::new(&config, sender),
            receiver,
            routes: RefCell::new(HashMap::new()),
        })
    }

    /// The factory of the current thread, created with the default config
    /// on first use.
    pub fn thread_default() -> Rc<Self> {
        THREAD_FACTORY.with(|slot| {
            slot.borrow_mut()
                .get_or_insert_with(|| Self::new(NativeEventSourceConfig::default()))
                .clone()
        })
    }

    /// Replace the factory of the current thread. Sources opened by the
    /// previous one keep working until dropped, but their signals are only
    /// delivered through that factory.
    pub fn install_thread_default(config: NativeEventSourceConfig) -> Rc<Self> {
        let factory = Self::new(config);
        THREAD_FACTORY.with(|slot| slot.borrow_mut().replace(factory.clone()));
        factory
    }

    pub fn connect(self: &Rc<Self>, url: &str, init: &EventSourceInit) -> Rc<NativeEventSource> {
        let id = self.manager.connect(url, init);
        let source = Rc::new(NativeEventSource {
            id,
            url: url.to_owned(),
            with_credentials: init.with_credentials,
            ready_state: Cell::new(ReadyState::Connecting),
            listeners: ListenerRegistry::new(),
            factory: self.clone(),
        });
        self.routes.borrow_mut().insert(id, Rc::downgrade(&source));
        source
    }

    /// This factory as a constructor capability. Each call returns a new
    /// capability; keep one around when it is used as a dependency.
    pub fn constructor(self: &Rc<Self>) -> EventSourceConstructor {
        let factory = self.clone();
        EventSourceConstructor::new(move |url, init| {
            EventSourceHandle::new(factory.connect(url, init))
        })
    }

    /// Deliver every queued signal, returns how many reached a live source.
    pub fn dispatch_pending(&self) -> usize {
        let mut delivered = 0;
        while let Ok(signal) = self.receiver.try_recv() {
            let source = self.routes.borrow().get(&signal.id).and_then(Weak::upgrade);
            let Some(source) = source else {
                log::debug!("[EventSource {}] Dropping signal for closed source", signal.id);
                continue;
            };
            source.deliver(signal.kind);
            delivered += 1;
        }
        delivered
    }

    /// Number of sources that have not been closed.
    pub fn live_sources(&self) -> usize {
        self.routes.borrow().len()
    }

    fn release(&self, id: u32) {
        self.routes.borrow_mut().remove(&id);
        self.manager.close(id);
    }
}

/// Event source backed by an HTTP stream.
pub struct NativeEventSource {
    id: u32,
    url: String,
    with_credentials: bool,
    ready_state: Cell<ReadyState>,
    listeners: ListenerRegistry,
    factory: Rc<NativeEventSourceFactory>,
}

impl NativeEventSource {
    pub fn id(&self) -> u32 {
        self.id
    }

    fn deliver(&self, kind: SignalKind) {
        if self.ready_state.get() == ReadyState::Closed {
            return;
        }
        match kind {
            SignalKind::Open => {
                self.ready_state.set(ReadyState::Open);
                self.listeners.dispatch(&EventSourceEvent::new(OPEN, ""));
            }
            SignalKind::Message(event) => {
                self.listeners.dispatch(&event);
            }
            SignalKind::Error(reason) => {
                self.ready_state.set(ReadyState::Closed);
                self.listeners.dispatch(&EventSourceEvent::new(ERROR, reason));
            }
        }
    }
}

impl EventSource for NativeEventSource {
    fn url(&self) -> &str {
        &self.url
    }

    fn with_credentials(&self) -> bool {
        self.with_credentials
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state.get()
    }

    fn add_event_listener(&self, event_type: &str, listener: &EventListener) {
        self.listeners.add(event_type, listener);
    }

    fn remove_event_listener(&self, event_type: &str, listener: &EventListener) {
        self.listeners.remove(event_type, listener);
    }

    fn close(&self) {
        self.ready_state.set(ReadyState::Closed);
        self.factory.release(self.id);
    }
}

impl Drop for NativeEventSource {
    fn drop(&mut self) {
        self.factory.release(self.id);
    }
}
