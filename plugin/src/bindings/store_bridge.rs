use crate::bindings::use_event_source_listener;
use crate::hooks::{Deps, HookError, RenderContext};
use crate::sse::{EventSourceEvent, EventSourceHandle};
use crate::store::Store;

/// [`use_event_source_listener`], with the scope's store passed to every
/// call of `listener`.
///
/// The store is looked up in the scope's context on each render and the
/// activation keeps the one it was bound with. A different store only
/// rebinds if it is part of `dependencies`.
///
/// Without a `Store<S, A>` in context nothing is bound and
/// [`HookError::MissingContext`] is returned.
pub fn use_event_source_listener_store<S, A, F>(
    cx: &mut RenderContext<'_>,
    source: Option<&EventSourceHandle>,
    types: &[&str],
    listener: F,
    dependencies: Deps,
) -> Result<(), HookError>
where
    S: 'static,
    A: 'static,
    F: Fn(&Store<S, A>, &EventSourceEvent) + 'static,
{
    let store = cx.use_context::<Store<S, A>>();
    let result = match store {
        Some(_) => Ok(()),
        None => Err(HookError::missing_context::<Store<S, A>>()),
    };
    let source = if store.is_some() { source } else { None };

    use_event_source_listener(
        cx,
        source,
        types,
        move |event| {
            if let Some(store) = &store {
                listener(store, event);
            }
        },
        dependencies,
    );

    result
}
