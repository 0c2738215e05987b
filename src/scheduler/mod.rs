//! Timer engine for deferred and repeating tasks.
//!
//! This module provides the scheduling loop, the handles used to register
//! tasks from any thread, and the tokens used to cancel them.

mod engine;
mod handle;
mod token;
mod types;

pub use engine::Timer;
pub use handle::TimerHandle;
pub use token::Token;
pub use types::TimerError;
