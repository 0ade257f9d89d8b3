//! Event source hooks
//!
//! `use_event_source` owns one connection per scope, `use_event_source_listener`
//! keeps handlers attached to it, and `use_event_source_listener_store` does
//! the same with the scope's [`Store`](crate::store::Store) handed to each call.
//!
//! ```ignore
//! fn feed(cx: &mut RenderContext<'_>) {
//!     let (source, status) = use_event_source(cx, "https://example.com/feed", None, None);
//!     use_event_source_listener(
//!         cx,
//!         source.as_ref(),
//!         &["message", "ping"],
//!         |event| log::info!("{}: {}", event.event_type, event.data),
//!         deps![],
//!     );
//! }
//! ```

mod connection;
mod listener;
mod store_bridge;

pub use connection::{EventSourceStatus, use_event_source};
pub use listener::use_event_source_listener;
pub use store_bridge::use_event_source_listener_store;
