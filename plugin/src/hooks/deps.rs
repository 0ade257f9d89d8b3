use std::any::Any;
use std::fmt;

/// A value that can take part in an effect's dependency list.
///
/// Implemented for every `PartialEq + 'static` type. Two dependencies are
/// equal only when they have the same concrete type and compare equal.
pub trait Dependency: 'static {
    fn dep_eq(&self, other: &dyn Dependency) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: PartialEq + 'static> Dependency for T {
    fn dep_eq(&self, other: &dyn Dependency) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Ordered dependency list of an effect.
///
/// Comparison is shallow and per element: an effect re-runs when the
/// length differs or any element at the same position is unequal.
#[derive(Default)]
pub struct Deps(Vec<Box<dyn Dependency>>);

impl Deps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dependency.
    pub fn with<T: PartialEq + 'static>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    pub fn push<T: PartialEq + 'static>(&mut self, value: T) {
        self.0.push(Box::new(value));
    }

    /// Append every dependency of `other`, keeping order.
    pub fn extend(mut self, other: Deps) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this list differs from the one seen on the previous render.
    pub fn changed_from(&self, previous: &Deps) -> bool {
        self.0.len() != previous.0.len()
            || self
                .0
                .iter()
                .zip(&previous.0)
                .any(|(current, previous)| !current.dep_eq(&**previous))
    }
}

impl fmt::Debug for Deps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deps").field("len", &self.0.len()).finish()
    }
}

/// Build a [`Deps`] list from expressions.
///
/// ```
/// use bevy_event_source::deps;
///
/// let room = String::from("lobby");
/// let deps = deps![room.clone(), 3_u32];
/// assert_eq!(deps.len(), 2);
/// ```
#[macro_export]
macro_rules! deps {
    () => {
        $crate::hooks::Deps::new()
    };
    ($($dep:expr),+ $(,)?) => {
        $crate::hooks::Deps::new()$(.with($dep))+
    };
}
