use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

/// Persistent state cell of a scope.
///
/// Writing marks the owning scope dirty so the host renders it again.
pub struct State<T> {
    value: Rc<RefCell<T>>,
    dirty: Rc<Cell<bool>>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            dirty: self.dirty.clone(),
        }
    }
}

impl<T> State<T> {
    pub(crate) fn new(value: T, dirty: Rc<Cell<bool>>) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            dirty,
        }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value;
        self.dirty.set(true);
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.value.borrow_mut());
        self.dirty.set(true);
    }

    /// Store `value` only if it differs; returns whether anything changed.
    pub fn set_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        let mut current = self.value.borrow_mut();
        if *current == value {
            return false;
        }
        *current = value;
        self.dirty.set(true);
        true
    }
}

/// Persistent mutable cell of a scope that never triggers a render.
pub struct HookRef<T>(Rc<RefCell<T>>);

impl<T> Clone for HookRef<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> HookRef<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    pub fn take(&self) -> T
    where
        T: Default,
    {
        self.0.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_marks_dirty() {
        let dirty = Rc::new(Cell::new(false));
        let state = State::new(1, dirty.clone());
        state.set(1);
        assert!(dirty.get());
        assert_eq!(state.get(), 1);
    }

    #[test]
    fn set_if_changed_skips_equal_values() {
        let dirty = Rc::new(Cell::new(false));
        let state = State::new("init", dirty.clone());
        assert!(!state.set_if_changed("init"));
        assert!(!dirty.get());
        assert!(state.set_if_changed("open"));
        assert!(dirty.get());
        assert_eq!(state.get(), "open");
    }

    #[test]
    fn refs_do_not_mark_anything() {
        let cell = HookRef::new(Vec::<u8>::new());
        cell.borrow_mut().push(3);
        assert_eq!(cell.take(), vec![3]);
        assert!(cell.borrow().is_empty());
    }
}
