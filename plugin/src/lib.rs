//! # Event Source Hooks for Bevy
//!
//! Bindings between a Server-Sent Events stream and reactive scopes: one
//! connection per scope with a status label, declarative listeners, and a
//! bridge that hands a dispatch-based store to each handler.
//!
//! ## Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_event_source::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(EventSourcePlugin::default())
//!         .add_systems(Startup, setup)
//!         .run();
//! }
//!
//! fn setup(mut roots: NonSendMut<ReactiveRoots>) {
//!     roots.mount(ContextMap::new(), |cx| {
//!         let (source, status) = use_event_source(cx, "http://localhost:8080/events", None, None);
//!         use_event_source_listener(
//!             cx,
//!             source.as_ref(),
//!             &["message"],
//!             |event| info!("{}", event.data),
//!             deps![],
//!         );
//!         info!("status: {}", status);
//!     });
//! }
//! ```

pub mod bindings;
pub mod hooks;
pub mod sse;
pub mod sse_bevy;
pub mod store;

pub use bindings::*;
pub use sse_bevy::*;

pub mod prelude {
    pub use crate::bindings::{
        EventSourceStatus, use_event_source, use_event_source_listener,
        use_event_source_listener_store,
    };
    pub use crate::deps;
    pub use crate::hooks::{ContextMap, Deps, EffectGuard, RenderContext, Scope};
    pub use crate::sse::{EventSourceConstructor, EventSourceEvent, EventSourceHandle};
    pub use crate::sse_bevy::{EventSourcePlugin, EventSourcePluginConfig, ReactiveRoots};
    pub use crate::store::Store;
}
