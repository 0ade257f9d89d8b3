//! Reducer-driven application store
//!
//! A single-threaded state container with a dispatch contract: actions go
//! through a reducer, the result replaces the state, then subscribers are
//! notified. Scopes reach it through their context.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("reducers may not dispatch actions")]
    DispatchInReducer,
}

type Reducer<S, A> = Box<dyn Fn(&S, &A) -> S>;
type Subscribers = Rc<RefCell<Vec<(u64, Rc<dyn Fn()>)>>>;

pub struct Store<S, A> {
    state: RefCell<Rc<S>>,
    reducer: Reducer<S, A>,
    subscribers: Subscribers,
    next_subscriber: Cell<u64>,
    dispatching: Cell<bool>,
}

impl<S: 'static, A: 'static> Store<S, A> {
    pub fn new(initial: S, reducer: impl Fn(&S, &A) -> S + 'static) -> Self {
        Self {
            state: RefCell::new(Rc::new(initial)),
            reducer: Box::new(reducer),
            subscribers: Rc::new(RefCell::new(Vec::new())),
            next_subscriber: Cell::new(0),
            dispatching: Cell::new(false),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> Rc<S> {
        self.state.borrow().clone()
    }

    /// Run `action` through the reducer and notify subscribers.
    ///
    /// Subscribers may dispatch; the reducer may not.
    pub fn dispatch(&self, action: A) -> Result<(), StoreError> {
        if self.dispatching.get() {
            return Err(StoreError::DispatchInReducer);
        }

        let next = {
            let _reducing = Reducing::enter(&self.dispatching);
            let current = self.state();
            (self.reducer)(&current, &action)
        };
        *self.state.borrow_mut() = Rc::new(next);

        let subscribers: Vec<Rc<dyn Fn()>> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, subscriber)| subscriber.clone())
            .collect();
        for subscriber in subscribers {
            subscriber();
        }
        Ok(())
    }

    /// Call `subscriber` after every dispatch until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe(&self, subscriber: impl Fn() + 'static) -> Subscription {
        let id = self.next_subscriber.get();
        self.next_subscriber.set(id + 1);
        self.subscribers
            .borrow_mut()
            .push((id, Rc::new(subscriber)));
        Subscription {
            subscribers: Rc::downgrade(&self.subscribers),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl<S: fmt::Debug, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state.borrow())
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}

/// Marks the store as reducing, even if the reducer panics.
struct Reducing<'a>(&'a Cell<bool>);

impl<'a> Reducing<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for Reducing<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Keeps a store subscriber registered.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    subscribers: Weak<RefCell<Vec<(u64, Rc<dyn Fn()>)>>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}
