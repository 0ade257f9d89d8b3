use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// The enclosing scope was not given a value of this type.
    #[error("no `{type_name}` was provided to this scope")]
    MissingContext { type_name: &'static str },
}

impl HookError {
    pub fn missing_context<T: ?Sized>() -> Self {
        HookError::MissingContext {
            type_name: std::any::type_name::<T>(),
        }
    }
}
