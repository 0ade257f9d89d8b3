//! Component instances and the render pass.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::hooks::{ContextMap, Deps, EffectGuard, HookRef, State};

/// Global counter for scope IDs
static SCOPE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
struct EffectSlot {
    deps: Option<Deps>,
    guard: Option<EffectGuard>,
}

struct PendingEffect {
    slot: usize,
    deps: Deps,
    setup: Box<dyn FnOnce() -> EffectGuard>,
}

/// One component instance: the unit whose lifetime bounds every resource
/// acquired by its effects.
///
/// Hooks are resolved by call order, so a render function must call the
/// same hooks in the same order every time.
pub struct Scope {
    id: ScopeId,
    slots: RefCell<Vec<Box<dyn Any>>>,
    dirty: Rc<Cell<bool>>,
    context: RefCell<ContextMap>,
    mounted: Cell<bool>,
    renders: Cell<u64>,
}

impl Scope {
    pub fn new(context: ContextMap) -> Self {
        let id = ScopeId(SCOPE_ID_COUNTER.fetch_add(1, Ordering::SeqCst) + 1);
        log::debug!("[Scope {}] Created", id);
        Self {
            id,
            slots: RefCell::new(Vec::new()),
            dirty: Rc::new(Cell::new(true)),
            context: RefCell::new(context),
            mounted: Cell::new(true),
            renders: Cell::new(0),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Whether some state changed since the last render.
    pub fn is_dirty(&self) -> bool {
        self.mounted.get() && self.dirty.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub fn render_count(&self) -> u64 {
        self.renders.get()
    }

    /// Replace an ambient value and schedule a render.
    pub fn provide_context<T: 'static>(&self, value: Rc<T>) {
        self.context.borrow_mut().insert(value);
        self.dirty.set(true);
    }

    /// Run one render pass, then commit the effects whose dependencies
    /// changed. Returns `None` once the scope is unmounted.
    ///
    /// # Panics
    ///
    /// Panics when the render function calls hooks in a different order
    /// than on the previous render.
    pub fn render<R>(&mut self, render: impl FnOnce(&mut RenderContext<'_>) -> R) -> Option<R> {
        if !self.mounted.get() {
            log::warn!("[Scope {}] Render requested after unmount", self.id);
            return None;
        }

        self.dirty.set(false);
        let mut cx = RenderContext {
            scope: self,
            cursor: 0,
            pending: Vec::new(),
        };
        let output = render(&mut cx);
        let RenderContext { cursor, pending, .. } = cx;

        let slot_count = self.slots.borrow().len();
        if cursor != slot_count {
            log::warn!(
                "[Scope {}] Rendered {} hooks but {} are registered",
                self.id,
                cursor,
                slot_count
            );
        }

        self.renders.set(self.renders.get() + 1);
        self.commit(pending);
        Some(output)
    }

    /// Tear down every live effect, in slot order.
    pub fn unmount(&mut self) {
        if !self.mounted.replace(false) {
            return;
        }
        log::debug!("[Scope {}] Unmounting", self.id);
        let slots = std::mem::take(self.slots.get_mut());
        for slot in slots {
            drop(slot);
        }
    }

    fn commit(&self, pending: Vec<PendingEffect>) {
        if pending.is_empty() {
            return;
        }

        // Every cleanup of this pass runs before any setup.
        for effect in &pending {
            let previous = self.with_effect_slot(effect.slot, |slot| slot.guard.take());
            drop(previous);
        }

        for effect in pending {
            let guard = (effect.setup)();
            self.with_effect_slot(effect.slot, |slot| {
                slot.deps = Some(effect.deps);
                slot.guard = Some(guard);
            });
        }
    }

    fn with_effect_slot<R>(&self, index: usize, f: impl FnOnce(&mut EffectSlot) -> R) -> R {
        let mut slots = self.slots.borrow_mut();
        let slot = slots
            .get_mut(index)
            .and_then(|slot| slot.downcast_mut::<EffectSlot>())
            .unwrap_or_else(|| hook_order_violation(self.id, index));
        f(slot)
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("mounted", &self.mounted.get())
            .field("dirty", &self.dirty.get())
            .field("renders", &self.renders.get())
            .finish()
    }
}

/// Hook API available while a scope renders.
pub struct RenderContext<'a> {
    scope: &'a Scope,
    cursor: usize,
    pending: Vec<PendingEffect>,
}

impl RenderContext<'_> {
    pub fn scope_id(&self) -> ScopeId {
        self.scope.id
    }

    /// Persistent state, initialized on the first render.
    pub fn use_state<T: 'static>(&mut self, init: impl FnOnce() -> T) -> State<T> {
        let dirty = self.scope.dirty.clone();
        self.use_slot(|| State::new(init(), dirty)).clone()
    }

    /// Persistent mutable cell that does not schedule renders.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> HookRef<T> {
        self.use_slot(|| HookRef::new(init())).clone()
    }

    /// Schedule `setup` to run after this render if `deps` changed since
    /// the activation currently in place. The guard it returns is released
    /// before the next activation and when the scope unmounts.
    pub fn use_effect(&mut self, deps: Deps, setup: impl FnOnce() -> EffectGuard + 'static) {
        let slot = self.cursor;
        let changed = self.use_slot(EffectSlot::default).with_deps(&deps);
        if changed {
            self.pending.push(PendingEffect {
                slot,
                deps,
                setup: Box::new(setup),
            });
        }
    }

    /// Resolve an ambient value provided to this scope.
    pub fn use_context<T: 'static>(&mut self) -> Option<Rc<T>> {
        self.scope.context.borrow().get::<T>()
    }

    fn use_slot<T: 'static>(&mut self, init: impl FnOnce() -> T) -> SlotRef<'_, T> {
        let index = self.cursor;
        self.cursor += 1;

        let missing = self.scope.slots.borrow().len() <= index;
        if missing {
            let value = Box::new(init());
            self.scope.slots.borrow_mut().push(value);
        }

        let slots = self.scope.slots.borrow();
        if slots.get(index).is_none_or(|slot| !slot.is::<T>()) {
            hook_order_violation(self.scope.id, index);
        }
        SlotRef {
            slots,
            index,
            _marker: std::marker::PhantomData,
        }
    }
}

struct SlotRef<'a, T> {
    slots: std::cell::Ref<'a, Vec<Box<dyn Any>>>,
    index: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T: 'static> std::ops::Deref for SlotRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.slots[self.index].downcast_ref::<T>() {
            Some(value) => value,
            None => unreachable!("slot type checked on creation"),
        }
    }
}

impl EffectSlot {
    fn with_deps(&self, deps: &Deps) -> bool {
        self.deps
            .as_ref()
            .is_none_or(|previous| deps.changed_from(previous))
    }
}

fn hook_order_violation(scope: ScopeId, index: usize) -> ! {
    panic!("[Scope {scope}] hook at slot {index} changed kind between renders; hooks must be called in the same order on every render")
}
