//! Configuration type definitions.
//!
//! This module contains the timer settings and the task plan consumed by the
//! `pt-timer` binary.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default name of the loop thread started by `Timer::spawn`.
pub const DEFAULT_THREAD_NAME: &str = "petit-timer";

/// Timer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Name given to the loop thread.
    pub thread_name: String,
    /// Stack size of the loop thread in bytes (platform default if unset).
    pub stack_size: Option<usize>,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            stack_size: None,
        }
    }
}

impl TimerConfig {
    /// Set the loop thread name.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the loop thread stack size.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

/// A set of tasks to register with one timer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Timer settings.
    #[serde(default)]
    pub timer: TimerConfig,
    /// Tasks to schedule.
    #[serde(default)]
    pub tasks: Vec<PlannedTask>,
}

impl PlanConfig {
    /// Built-in demo plan: three one-shot tasks and one repeating task.
    pub fn demo() -> Self {
        Self {
            timer: TimerConfig::default(),
            tasks: vec![
                PlannedTask::once("hello-a", 2_000),
                PlannedTask::repeating("hello-r", 2_000, 1_000),
                PlannedTask::once("hello-b", 2_000),
                PlannedTask::once("hello-c", 4_000),
            ],
        }
    }
}

/// One task in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTask {
    /// Task name, used in log output.
    pub name: String,
    /// Initial delay in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,
    /// Repeat interval in milliseconds; omit for a one-shot task.
    pub every_ms: Option<u64>,
}

impl PlannedTask {
    /// Create a one-shot task.
    pub fn once(name: impl Into<String>, delay_ms: u64) -> Self {
        Self {
            name: name.into(),
            delay_ms,
            every_ms: None,
        }
    }

    /// Create a repeating task.
    pub fn repeating(name: impl Into<String>, delay_ms: u64, every_ms: u64) -> Self {
        Self {
            name: name.into(),
            delay_ms,
            every_ms: Some(every_ms),
        }
    }

    /// Initial delay.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Repeat interval; zero for a one-shot task.
    pub fn interval(&self) -> Duration {
        self.every_ms.map(Duration::from_millis).unwrap_or_default()
    }
}
