/// Cleanup of one effect activation.
///
/// The cleanup runs exactly once, when the guard is released or dropped.
/// An effect slot owns the guard of its current activation, so unmounting a
/// scope or re-running the effect always tears the previous activation down.
#[must_use = "dropping the guard runs the cleanup immediately"]
pub struct EffectGuard {
    cleanup: Option<Box<dyn FnOnce()>>,
}

impl EffectGuard {
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    /// An activation with nothing to tear down.
    pub fn none() -> Self {
        Self { cleanup: None }
    }

    /// Run the cleanup now.
    pub fn release(mut self) {
        self.run();
    }

    pub fn is_armed(&self) -> bool {
        self.cleanup.is_some()
    }

    fn run(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl Drop for EffectGuard {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for EffectGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectGuard")
            .field("armed", &self.is_armed())
            .finish()
    }
}
