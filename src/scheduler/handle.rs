//! Timer handle for scheduling from any thread.
//!
//! This module provides the `TimerHandle` type that lets other threads
//! register tasks, request a stop, and observe the loop's run state.

use std::sync::Arc;
use std::time::Duration;

use super::engine::Shared;
use super::token::Token;

/// Handle for scheduling tasks on a timer.
///
/// Cheap to clone; every clone talks to the same timer. Handles keep the
/// timer's shared state alive, tokens do not.
#[derive(Clone)]
pub struct TimerHandle {
    shared: Arc<Shared>,
}

impl TimerHandle {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Run `callback` once, no earlier than `delay` from now.
    ///
    /// A zero delay fires as soon as the loop next polls. Dropping the
    /// returned token cancels the task.
    pub fn schedule<F>(&self, delay: Duration, callback: F) -> Token
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.schedule_once(delay, callback)
    }

    /// Run `callback` after `delay`, then again every `interval`.
    ///
    /// Each repeat is re-armed at `interval` past the moment the previous
    /// firing was pulled from the store, before that firing's callback runs,
    /// so slow callbacks do not push later due times back. A zero `interval`
    /// makes this a one-shot task.
    pub fn schedule_repeating<F>(&self, delay: Duration, interval: Duration, callback: F) -> Token
    where
        F: FnMut() + Send + 'static,
    {
        self.shared.schedule(delay, interval, callback)
    }

    /// Ask the loop to exit. Idempotent; safe before the loop starts.
    ///
    /// Pending tasks are abandoned, not fired.
    pub fn request_stop(&self) {
        self.shared.request_stop();
    }

    /// Whether a stop has been requested and not yet consumed by the loop.
    pub fn is_stop_requested(&self) -> bool {
        self.shared.is_stop_requested()
    }

    /// Whether the loop is currently running.
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Wait up to `timeout` for the loop to start. Returns `false` on timeout.
    pub fn wait_until_running(&self, timeout: Duration) -> bool {
        self.shared.wait_until_running(timeout)
    }

    /// Wait up to `timeout` for the loop to stop. Returns `false` on timeout.
    pub fn wait_until_stopped(&self, timeout: Duration) -> bool {
        self.shared.wait_until_stopped(timeout)
    }

    /// Number of pending tasks.
    ///
    /// A snapshot taken under the task lock; it may be stale by the time it
    /// is returned.
    pub fn task_count(&self) -> usize {
        self.shared.task_count()
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
