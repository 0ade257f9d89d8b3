use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::deps;
use crate::hooks::{EffectGuard, RenderContext, State};
use crate::sse::{
    ERROR, EventListener, EventSourceConstructor, EventSourceHandle, EventSourceInit, OPEN,
    default_constructor,
};

/// Lifecycle label of the scope's connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSourceStatus {
    /// A connection was created and has not signalled yet.
    #[default]
    Init,
    Open,
    /// No address was given, so there is no connection.
    Closed,
    Error,
}

impl EventSourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSourceStatus::Init => "init",
            EventSourceStatus::Open => "open",
            EventSourceStatus::Closed => "closed",
            EventSourceStatus::Error => "error",
        }
    }
}

impl fmt::Display for EventSourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Own one connection to `url` for the lifetime of the scope.
///
/// The connection is replaced whenever `url`, `with_credentials` or
/// `constructor` changes, and closed on unmount. An empty `url` means no
/// connection and reports [`EventSourceStatus::Closed`]. Failures never
/// propagate; they only show up as [`EventSourceStatus::Error`].
///
/// `with_credentials` defaults to `false` and `constructor` to
/// [`default_constructor`].
pub fn use_event_source(
    cx: &mut RenderContext<'_>,
    url: &str,
    with_credentials: Option<bool>,
    constructor: Option<&EventSourceConstructor>,
) -> (Option<EventSourceHandle>, EventSourceStatus) {
    let source = cx.use_state(|| None::<EventSourceHandle>);
    let status = cx.use_state(EventSourceStatus::default);

    let init = EventSourceInit {
        with_credentials: with_credentials.unwrap_or(false),
    };
    let constructor = constructor.cloned().unwrap_or_else(default_constructor);
    let disconnected = url.is_empty();
    let url = url.to_owned();

    cx.use_effect(deps![url.clone(), init, constructor.clone()], {
        let source = source.clone();
        let status = status.clone();
        move || connect(&url, &init, &constructor, source, status)
    });

    if disconnected {
        return (None, EventSourceStatus::Closed);
    }
    (source.get(), status.get())
}

fn connect(
    url: &str,
    init: &EventSourceInit,
    constructor: &EventSourceConstructor,
    source: State<Option<EventSourceHandle>>,
    status: State<EventSourceStatus>,
) -> EffectGuard {
    if url.is_empty() {
        status.set_if_changed(EventSourceStatus::Closed);
        return EffectGuard::none();
    }

    let es = constructor.construct(url, init);
    let live = Rc::new(Cell::new(true));
    let on_open = status_listener(&live, &status, EventSourceStatus::Open);
    let on_error = status_listener(&live, &status, EventSourceStatus::Error);
    es.add_event_listener(OPEN, &on_open);
    es.add_event_listener(ERROR, &on_error);

    source.set(Some(es.clone()));
    status.set_if_changed(EventSourceStatus::Init);

    EffectGuard::new(move || {
        // Forget the handle before closing it so nothing it signals from
        // here on is taken as current state.
        live.set(false);
        source.set(None);
        es.remove_event_listener(OPEN, &on_open);
        es.remove_event_listener(ERROR, &on_error);
        es.close();
    })
}

fn status_listener(
    live: &Rc<Cell<bool>>,
    status: &State<EventSourceStatus>,
    next: EventSourceStatus,
) -> EventListener {
    let live = live.clone();
    let status = status.clone();
    EventListener::new(move |_| {
        if live.get() {
            status.set_if_changed(next);
        }
    })
}
