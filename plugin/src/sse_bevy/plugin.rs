//! Event Source Bevy Plugin Implementation

use bevy::prelude::*;
use std::sync::Mutex;

use crate::sse::{NativeEventSourceConfig, NativeEventSourceFactory, set_default_constructor};
use crate::sse_bevy::ReactiveRoots;

/// Configuration for the event source plugin.
#[derive(Default)]
pub struct EventSourcePluginConfig {
    /// HTTP settings of the native event source (wrapped for interior mutability).
    native: Mutex<Option<NativeEventSourceConfig>>,
}

impl EventSourcePluginConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the HTTP settings used by sources opened without an explicit
    /// constructor.
    pub fn with_native(self, config: NativeEventSourceConfig) -> Self {
        if let Ok(mut guard) = self.native.lock() {
            *guard = Some(config);
        }
        self
    }

    /// Take the native settings out of the config.
    fn take_native(&self) -> NativeEventSourceConfig {
        self.native
            .lock()
            .ok()
            .and_then(|mut guard| guard.take())
            .unwrap_or_default()
    }
}

/// Bevy plugin for reactive event source scopes.
///
/// This plugin:
/// - Installs the main thread's native event source factory as the default
///   constructor
/// - Inserts [`ReactiveRoots`] as a non-send resource for mounting scopes
/// - Each frame, delivers pending network signals and re-renders dirty roots
///
/// ## Usage
///
/// ```ignore
/// App::new()
///     .add_plugins(EventSourcePlugin::new(EventSourcePluginConfig::new()))
///     .run();
/// ```
#[derive(Default)]
pub struct EventSourcePlugin {
    config: EventSourcePluginConfig,
}

impl EventSourcePlugin {
    pub fn new(config: EventSourcePluginConfig) -> Self {
        Self { config }
    }
}

impl Plugin for EventSourcePlugin {
    fn build(&self, app: &mut App) {
        log::info!("Building event source plugin...");

        let factory = NativeEventSourceFactory::install_thread_default(self.config.take_native());
        set_default_constructor(factory.constructor());

        app.insert_non_send_resource(ReactiveRoots::default());
        app.add_systems(Update, drive_reactive_roots);

        log::info!("Event source plugin configured");
    }
}

/// Deliver network signals, then re-render the scopes they touched.
fn drive_reactive_roots(mut roots: NonSendMut<ReactiveRoots>) {
    let delivered = crate::sse::dispatch_pending();
    let rendered = roots.render_dirty();
    if delivered > 0 || rendered > 0 {
        log::debug!(
            "Delivered {} event source signals, rendered {} roots",
            delivered,
            rendered
        );
    }
}
