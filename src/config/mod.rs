//! Configuration loading and parsing.
//!
//! This module provides YAML-based configuration for timer settings and
//! task plans.

mod error;
mod types;
mod yaml;

pub use error::ConfigError;
pub use types::{DEFAULT_THREAD_NAME, PlanConfig, PlannedTask, TimerConfig};
pub use yaml::YamlLoader;
