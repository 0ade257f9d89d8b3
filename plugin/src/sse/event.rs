use serde::de::DeserializeOwned;

/// Event type of the connection-ready signal.
pub const OPEN: &str = "open";
/// Event type of the connection-failure signal.
pub const ERROR: &str = "error";
/// Event type of unnamed messages.
pub const MESSAGE: &str = "message";

/// A received event, or one of the `open`/`error` signals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventSourceEvent {
    pub event_type: String,
    pub data: String,
    pub last_event_id: String,
    pub origin: String,
}

impl EventSourceEvent {
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
            ..Default::default()
        }
    }

    /// An unnamed `message` event.
    pub fn message(data: impl Into<String>) -> Self {
        Self::new(MESSAGE, data)
    }

    pub fn with_last_event_id(mut self, id: impl Into<String>) -> Self {
        self.last_event_id = id.into();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Convert an event decoded from the wire, attributed to `origin`.
    ///
    /// An event without an `event` field is a `message`.
    pub fn from_stream(event: eventsource_stream::Event, origin: &str) -> Self {
        let event_type = if event.event.is_empty() {
            MESSAGE.to_owned()
        } else {
            event.event
        };
        Self {
            event_type,
            data: event.data,
            last_event_id: event.id,
            origin: origin.to_owned(),
        }
    }

    /// Decode `data` as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.data)
    }
}
