use std::cell::Cell;
use std::rc::Rc;

use bevy::prelude::*;
use bevy_event_source::prelude::*;
use serde::Deserialize;

const DEFAULT_URL: &str = "http://localhost:8080/events";

#[derive(Debug, Default)]
struct FeedState {
    messages: Vec<String>,
    pings: u32,
}

enum FeedAction {
    Received(String),
    Ping,
}

#[derive(Deserialize)]
struct ChatMessage {
    text: String,
}

fn reduce(state: &FeedState, action: &FeedAction) -> FeedState {
    let mut messages = state.messages.clone();
    let mut pings = state.pings;
    match action {
        FeedAction::Received(text) => messages.push(text.clone()),
        FeedAction::Ping => pings += 1,
    }
    FeedState { messages, pings }
}

/// What the label system reads; written by the mounted scope.
struct FeedView {
    store: Rc<Store<FeedState, FeedAction>>,
    status: Rc<Cell<EventSourceStatus>>,
}

#[derive(Component)]
struct FeedLabel;

fn main() {
    let view = FeedView {
        store: Rc::new(Store::new(FeedState::default(), reduce)),
        status: Rc::new(Cell::new(EventSourceStatus::Init)),
    };

    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(EventSourcePlugin::default())
        .insert_non_send_resource(view)
        .add_systems(Startup, setup)
        .add_systems(Update, update_label)
        .run();
}

fn setup(mut commands: Commands, view: NonSend<FeedView>, mut roots: NonSendMut<ReactiveRoots>) {
    commands.spawn(Camera2d);
    commands.spawn((
        Text::new("connecting..."),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        FeedLabel,
    ));

    let url = std::env::var("EVENT_SOURCE_URL").unwrap_or_else(|_| DEFAULT_URL.to_owned());
    info!("Streaming events from {}", url);

    let status = view.status.clone();
    roots.mount(ContextMap::new().with(view.store.clone()), move |cx| {
        let (source, current) = use_event_source(cx, &url, None, None);
        status.set(current);

        let bound = use_event_source_listener_store(
            cx,
            source.as_ref(),
            &["message", "ping"],
            |store: &Store<FeedState, FeedAction>, event| {
                let action = if event.event_type == "ping" {
                    FeedAction::Ping
                } else {
                    match event.json::<ChatMessage>() {
                        Ok(message) => FeedAction::Received(message.text),
                        Err(e) => {
                            warn!("Skipping malformed message: {}", e);
                            return;
                        }
                    }
                };
                if let Err(e) = store.dispatch(action) {
                    error!("Dispatch failed: {}", e);
                }
            },
            deps![],
        );
        if let Err(e) = bound {
            error!("{}", e);
        }
    });
}

fn update_label(view: NonSend<FeedView>, mut label: Single<&mut Text, With<FeedLabel>>) {
    let state = view.store.state();
    let last = state.messages.last().map(String::as_str).unwrap_or("-");
    let text = format!(
        "status: {}\nmessages: {}\npings: {}\nlast: {}",
        view.status.get(),
        state.messages.len(),
        state.pings,
        last
    );
    if label.0 != text {
        label.0 = text;
    }
}
