use crate::hooks::{Deps, EffectGuard, RenderContext};
use crate::sse::{EventListener, EventSourceEvent, EventSourceHandle};

/// Keep `listener` attached to `types` on `source` while `source` and
/// `dependencies` stay the same.
///
/// Only `source` and `dependencies` are compared between renders. A new
/// `listener` or `types` value alone does not rebind; list whatever the
/// listener captures in `dependencies` to pick it up.
pub fn use_event_source_listener<F>(
    cx: &mut RenderContext<'_>,
    source: Option<&EventSourceHandle>,
    types: &[&str],
    listener: F,
    dependencies: Deps,
) where
    F: Fn(&EventSourceEvent) + 'static,
{
    let source = source.cloned();
    let types: Vec<String> = types.iter().map(|ty| (*ty).to_owned()).collect();
    let deps = Deps::new().with(source.clone()).extend(dependencies);

    cx.use_effect(deps, move || {
        let Some(source) = source else {
            return EffectGuard::none();
        };

        let listener = EventListener::new(listener);
        for ty in &types {
            source.add_event_listener(ty, &listener);
        }
        log::debug!("Bound {:?} on {}", types, source.url());

        EffectGuard::new(move || {
            for ty in &types {
                source.remove_event_listener(ty, &listener);
            }
            log::debug!("Unbound {:?} from {}", types, source.url());
        })
    });
}
