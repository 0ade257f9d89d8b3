//! Network side of the native event source.
//!
//! Each connection runs as a task on a shared Tokio runtime and pushes its
//! signals into a channel drained on the host thread, the same way input
//! and WebSocket events are pushed to the UI side.

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, mpsc};
use tokio::task::JoinHandle;

use crate::sse::{EventSourceError, EventSourceEvent, EventSourceInit, NativeEventSourceConfig};

/// Static Tokio runtime for connection tasks, usable from threads that
/// have no runtime of their own (e.g. the Bevy main thread).
pub(crate) static TOKIO: once_cell::sync::Lazy<tokio::runtime::Runtime> =
    once_cell::sync::Lazy::new(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("event-source")
            .build()
            .expect("Failed to build Tokio runtime")
    });

/// What happened on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalKind {
    Open,
    Message(EventSourceEvent),
    Error(String),
}

/// A signal addressed to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub id: u32,
    pub kind: SignalKind,
}

/// Manages all native connections
pub struct EventSourceManager {
    sender: mpsc::Sender<Signal>,
    anonymous: reqwest::Client,
    credentialed: reqwest::Client,
    tasks: Mutex<HashMap<u32, JoinHandle<()>>>,
    next_id: AtomicU32,
}

impl EventSourceManager {
    pub fn new(config: &NativeEventSourceConfig, sender: mpsc::Sender<Signal>) -> Self {
        Self {
            sender,
            anonymous: config.build_client(false),
            credentialed: config.build_client(true),
            tasks: Mutex::new(HashMap::new()),
            next_id: AtomicU32::new(1),
        }
    }

    /// Start connecting to `url`, returns the connection ID immediately
    pub fn connect(&self, url: &str, init: &EventSourceInit) -> u32 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let client = if init.with_credentials {
            self.credentialed.clone()
        } else {
            self.anonymous.clone()
        };

        log::info!("[EventSource {}] Connecting to {}", id, url);
        let task = TOKIO.spawn(run_connection(id, url.to_owned(), client, self.sender.clone()));

        self.lock().insert(id, task);
        id
    }

    /// Close a connection. Returns `false` if it was already closed.
    pub fn close(&self, id: u32) -> bool {
        let Some(task) = self.lock().remove(&id) else {
            return false;
        };
        task.abort();
        log::info!("[EventSource {}] Closing", id);
        true
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for EventSourceManager {
    fn drop(&mut self) {
        for (_, task) in self.lock().drain() {
            task.abort();
        }
    }
}

async fn run_connection(
    id: u32,
    url: String,
    client: reqwest::Client,
    sender: mpsc::Sender<Signal>,
) {
    let error = match stream_events(id, &url, &client, &sender).await {
        Ok(()) => EventSourceError::Ended,
        Err(e) => e,
    };
    log::warn!("[EventSource {}] {}", id, error);
    let _ = sender.send(Signal {
        id,
        kind: SignalKind::Error(error.to_string()),
    });
    log::info!("[EventSource {}] Connection ended", id);
}

/// Connect and forward events until the stream ends or fails.
async fn stream_events(
    id: u32,
    url: &str,
    client: &reqwest::Client,
    sender: &mpsc::Sender<Signal>,
) -> Result<(), EventSourceError> {
    let url = url::Url::parse(url).map_err(|source| EventSourceError::InvalidUrl {
        url: url.to_owned(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(EventSourceError::UnsupportedScheme(url.scheme().to_owned()));
    }

    let response = client
        .get(url.clone())
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-store")
        .send()
        .await?;

    if response.status() != StatusCode::OK {
        return Err(EventSourceError::Status(response.status()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !is_event_stream(content_type) {
        return Err(EventSourceError::ContentType(content_type.to_owned()));
    }

    log::info!("[EventSource {}] Open (status: {})", id, response.status());
    if sender.send(Signal { id, kind: SignalKind::Open }).is_err() {
        return Ok(());
    }

    let origin = url.origin().ascii_serialization();
    let mut events = std::pin::pin!(response.bytes_stream().eventsource());
    while let Some(event) = events.next().await {
        let event = event.map_err(EventSourceError::Stream)?;
        let event = EventSourceEvent::from_stream(event, &origin);
        log::debug!(
            "[EventSource {}] Received {}: {}",
            id,
            event.event_type,
            preview(&event.data)
        );
        if sender
            .send(Signal {
                id,
                kind: SignalKind::Message(event),
            })
            .is_err()
        {
            return Ok(());
        }
    }

    Ok(())
}

/// At most the first 100 characters of `data`, for logging.
fn preview(data: &str) -> &str {
    match data.char_indices().nth(100) {
        Some((end, _)) => &data[..end],
        None => data,
    }
}

fn is_event_stream(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("text/event-stream"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_essence_is_compared() {
        assert!(is_event_stream("text/event-stream"));
        assert!(is_event_stream("Text/Event-Stream; charset=utf-8"));
        assert!(!is_event_stream("text/plain"));
        assert!(!is_event_stream(""));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let long = "é".repeat(150);
        assert_eq!(preview(&long).chars().count(), 100);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn unknown_connection_is_already_closed() {
        let (sender, _receiver) = mpsc::channel();
        let manager = EventSourceManager::new(&NativeEventSourceConfig::default(), sender);
        assert!(!manager.close(42));
    }
}
