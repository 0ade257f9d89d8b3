#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bevy_event_source::hooks::{RenderContext, Scope};
use bevy_event_source::sse::{
    ERROR, EventListener, EventSource, EventSourceConstructor, EventSourceEvent,
    EventSourceHandle, EventSourceInit, ListenerRegistry, OPEN, ReadyState,
};

/// In-memory event source driven by the test.
pub struct MockEventSource {
    url: String,
    init: EventSourceInit,
    ready_state: Cell<ReadyState>,
    listeners: ListenerRegistry,
    close_calls: Cell<usize>,
    journal: RefCell<Vec<String>>,
}

impl MockEventSource {
    pub fn new(url: &str, init: &EventSourceInit) -> Self {
        Self {
            url: url.to_owned(),
            init: *init,
            ready_state: Cell::new(ReadyState::Connecting),
            listeners: ListenerRegistry::new(),
            close_calls: Cell::new(0),
            journal: RefCell::new(Vec::new()),
        }
    }

    pub fn open(&self) {
        if self.is_closed() {
            return;
        }
        self.ready_state.set(ReadyState::Open);
        self.listeners.dispatch(&EventSourceEvent::new(OPEN, ""));
    }

    pub fn fail(&self) {
        if self.is_closed() {
            return;
        }
        self.ready_state.set(ReadyState::Closed);
        self.listeners.dispatch(&EventSourceEvent::new(ERROR, "connection lost"));
    }

    pub fn emit(&self, event_type: &str, data: &str) -> usize {
        if self.is_closed() {
            return 0;
        }
        self.listeners.dispatch(&EventSourceEvent::new(event_type, data))
    }

    /// Dispatch to whatever is still registered, ignoring `close()`.
    pub fn emit_after_close(&self, event_type: &str) -> usize {
        self.listeners.dispatch(&EventSourceEvent::new(event_type, ""))
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.get()
    }

    pub fn is_closed(&self) -> bool {
        self.close_calls.get() > 0
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners.count(event_type)
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Every attach and detach so far, as `add:<type>` / `remove:<type>`.
    pub fn take_journal(&self) -> Vec<String> {
        self.journal.take()
    }

    pub fn init(&self) -> EventSourceInit {
        self.init
    }
}

impl EventSource for MockEventSource {
    fn url(&self) -> &str {
        &self.url
    }

    fn with_credentials(&self) -> bool {
        self.init.with_credentials
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state.get()
    }

    fn add_event_listener(&self, event_type: &str, listener: &EventListener) {
        self.journal.borrow_mut().push(format!("add:{event_type}"));
        self.listeners.add(event_type, listener);
    }

    fn remove_event_listener(&self, event_type: &str, listener: &EventListener) {
        self.journal.borrow_mut().push(format!("remove:{event_type}"));
        self.listeners.remove(event_type, listener);
    }

    fn close(&self) {
        self.close_calls.set(self.close_calls.get() + 1);
        self.ready_state.set(ReadyState::Closed);
    }
}

/// Records every source it creates.
#[derive(Default)]
pub struct MockFactory {
    created: RefCell<Vec<Rc<MockEventSource>>>,
}

impl MockFactory {
    pub fn new() -> (Rc<Self>, EventSourceConstructor) {
        let factory = Rc::new(Self::default());
        let constructor = {
            let factory = factory.clone();
            EventSourceConstructor::new(move |url, init| {
                let source = Rc::new(MockEventSource::new(url, init));
                factory.created.borrow_mut().push(source.clone());
                EventSourceHandle::new(source)
            })
        };
        (factory, constructor)
    }

    pub fn created(&self) -> usize {
        self.created.borrow().len()
    }

    pub fn source(&self, index: usize) -> Rc<MockEventSource> {
        self.created.borrow()[index].clone()
    }

    pub fn last(&self) -> Rc<MockEventSource> {
        self.created
            .borrow()
            .last()
            .cloned()
            .expect("no source created")
    }
}

/// Render, then keep rendering while effects leave the scope dirty.
pub fn settle<R>(scope: &mut Scope, mut render: impl FnMut(&mut RenderContext<'_>) -> R) -> R {
    let mut output = scope.render(&mut render).expect("scope is mounted");
    for _ in 0..8 {
        if !scope.is_dirty() {
            break;
        }
        output = scope.render(&mut render).expect("scope is mounted");
    }
    output
}
