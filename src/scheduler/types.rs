//! Timer type definitions.

use thiserror::Error;

/// Errors that can occur when starting a timer.
///
/// Scheduling and cancelling never fail; only bringing up the loop thread can.
#[derive(Debug, Error)]
pub enum TimerError {
    /// The OS refused to start the loop thread.
    #[error("failed to spawn timer thread '{thread_name}': {source}")]
    Spawn {
        thread_name: String,
        #[source]
        source: std::io::Error,
    },
}
