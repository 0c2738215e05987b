//! Core building blocks of the timer.
//!
//! - [`types`]: identifiers
//! - [`guard`]: scoped enter/exit actions
//! - `store`: the ordered task store the scheduling loop runs on

pub mod guard;
pub(crate) mod store;
pub mod types;
