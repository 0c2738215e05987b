//! Cancellation tokens.
//!
//! A token refers to its task through a weak reference to the task's
//! locator. The locator follows the task across re-arms and is invalidated
//! when the task leaves the timer for good, so a token can race with,
//! outlive, or follow the firing it cancels without ever touching a stale
//! position.

use std::sync::Weak;

use crate::core::store::Locator;
use crate::core::types::TaskId;

use super::engine::Shared;

/// Handle governing one scheduled task.
///
/// Not clonable: at most one token controls a registration. Dropping the
/// token cancels the task if it is still pending.
#[must_use = "dropping a Token cancels the task it was returned for"]
#[derive(Default)]
pub struct Token {
    id: Option<TaskId>,
    shared: Weak<Shared>,
    locator: Weak<Locator>,
}

impl Token {
    pub(crate) fn new(id: TaskId, shared: Weak<Shared>, locator: Weak<Locator>) -> Self {
        Self {
            id: Some(id),
            shared,
            locator,
        }
    }

    /// Id of the task this token governs; `None` for an empty token.
    pub fn task_id(&self) -> Option<TaskId> {
        self.id
    }

    /// Cancel the task.
    ///
    /// Returns `true` if this call removed a pending entry. Cancelling an
    /// already fired, already cancelled, or empty token is a no-op. A
    /// callback already in flight still completes, but a repeating task is
    /// not re-armed afterwards.
    pub fn cancel(&self) -> bool {
        let Some(locator) = self.locator.upgrade() else {
            return false;
        };
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };

        shared.cancel_by(&locator)
    }

    /// Whether the task is gone for good.
    ///
    /// A one-shot task expires once it has been pulled for firing; a
    /// repeating task only expires when cancelled.
    pub fn expired(&self) -> bool {
        self.locator
            .upgrade()
            .is_none_or(|locator| !locator.is_valid())
    }
}

impl Drop for Token {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("task_id", &self.id)
            .field("expired", &self.expired())
            .finish()
    }
}
