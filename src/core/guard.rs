//! Scoped enter/exit actions.

/// Runs an init closure on construction and an exit closure when dropped.
///
/// The exit closure also runs while unwinding, which makes this suitable for
/// state flips that must be undone on every exit path.
///
/// # Example
///
/// ```
/// use petit_timer::ScopedAction;
/// use std::cell::Cell;
///
/// let depth = Cell::new(0);
/// {
///     let _guard = ScopedAction::new(|| depth.set(1), || depth.set(0));
///     assert_eq!(depth.get(), 1);
/// }
/// assert_eq!(depth.get(), 0);
/// ```
#[must_use = "the exit action runs as soon as the guard is dropped"]
pub struct ScopedAction<F: FnOnce()> {
    exit: Option<F>,
}

impl<F: FnOnce()> ScopedAction<F> {
    /// Run `init` now and defer `exit` until the guard goes out of scope.
    pub fn new(init: impl FnOnce(), exit: F) -> Self {
        init();
        Self { exit: Some(exit) }
    }

    /// Defer `exit` without an init step.
    pub fn on_exit(exit: F) -> Self {
        Self { exit: Some(exit) }
    }
}

impl<F: FnOnce()> Drop for ScopedAction<F> {
    fn drop(&mut self) {
        if let Some(exit) = self.exit.take() {
            exit();
        }
    }
}
