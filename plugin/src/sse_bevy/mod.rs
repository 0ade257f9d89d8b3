//! Event Source Bevy Plugin
//!
//! Provides Bevy integration for reactive scopes and native event sources.
//! The plugin hosts the scopes as a non-send resource and drives them once
//! per frame.

mod plugin;
mod roots;

pub use plugin::{EventSourcePlugin, EventSourcePluginConfig};
pub use roots::{ReactiveRoots, RootId};
