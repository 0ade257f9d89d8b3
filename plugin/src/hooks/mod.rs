//! Reactive Scope Runtime
//!
//! A small hook runtime that plays the role of the host UI framework:
//! component instances (`Scope`), persistent state cells, refs, effects
//! keyed by dependency lists, and explicit context lookup.
//! No Bevy dependencies - this can be used standalone.

mod context;
mod deps;
mod effect;
mod error;
mod scope;
mod state;

pub use context::ContextMap;
pub use deps::{Dependency, Deps};
pub use effect::EffectGuard;
pub use error::HookError;
pub use scope::{RenderContext, Scope, ScopeId};
pub use state::{HookRef, State};
