use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

/// Ambient values available to a scope, keyed by type.
///
/// Each scope carries its own map, so independent scopes can resolve
/// independent instances of the same type (a store per test, for example).
#[derive(Clone, Default)]
pub struct ContextMap {
    values: HashMap<TypeId, Rc<dyn Any>>,
}

impl ContextMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide a value, builder style.
    pub fn with<T: 'static>(mut self, value: Rc<T>) -> Self {
        self.insert(value);
        self
    }

    /// Provide a value, returning the one it replaces.
    pub fn insert<T: 'static>(&mut self, value: Rc<T>) -> Option<Rc<T>> {
        self.values
            .insert(TypeId::of::<T>(), value)
            .and_then(|previous| previous.downcast::<T>().ok())
    }

    pub fn remove<T: 'static>(&mut self) -> Option<Rc<T>> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|previous| previous.downcast::<T>().ok())
    }

    pub fn get<T: 'static>(&self) -> Option<Rc<T>> {
        self.values
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for ContextMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextMap")
            .field("len", &self.values.len())
            .finish()
    }
}
