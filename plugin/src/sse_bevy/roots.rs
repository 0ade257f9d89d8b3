use std::collections::BTreeMap;

use crate::hooks::{ContextMap, RenderContext, Scope};

type RenderFn = Box<dyn FnMut(&mut RenderContext<'_>)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RootId(u64);

struct Root {
    scope: Scope,
    render: RenderFn,
}

/// Mounted scopes of the app, re-rendered by the plugin whenever their
/// state changes.
///
/// Scopes hold `Rc`s, so this is inserted as a non-send resource and only
/// touched from the main thread.
#[derive(Default)]
pub struct ReactiveRoots {
    roots: BTreeMap<RootId, Root>,
    next_id: u64,
}

impl ReactiveRoots {
    /// Mount a scope and render it right away.
    pub fn mount(
        &mut self,
        context: ContextMap,
        render: impl FnMut(&mut RenderContext<'_>) + 'static,
    ) -> RootId {
        self.next_id += 1;
        let id = RootId(self.next_id);

        let mut root = Root {
            scope: Scope::new(context),
            render: Box::new(render),
        };
        root.render_once();
        log::info!("Mounted root {:?} (scope {})", id, root.scope.id());

        self.roots.insert(id, root);
        id
    }

    /// Unmount a scope, tearing down everything its effects hold.
    pub fn unmount(&mut self, id: RootId) -> bool {
        match self.roots.remove(&id) {
            Some(mut root) => {
                root.scope.unmount();
                log::info!("Unmounted root {:?}", id);
                true
            }
            None => false,
        }
    }

    /// Render every dirty root once, returns how many rendered.
    pub fn render_dirty(&mut self) -> usize {
        let mut rendered = 0;
        for root in self.roots.values_mut() {
            if root.scope.is_dirty() {
                root.render_once();
                rendered += 1;
            }
        }
        rendered
    }

    pub fn is_mounted(&self, id: RootId) -> bool {
        self.roots.contains_key(&id)
    }

    pub fn is_dirty(&self, id: RootId) -> bool {
        self.roots.get(&id).is_some_and(|root| root.scope.is_dirty())
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl Root {
    fn render_once(&mut self) {
        self.scope.render(|cx| (self.render)(cx));
    }
}
