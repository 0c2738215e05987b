//! YAML configuration parsing.
//!
//! Parses timer settings and task plans from YAML files.

use std::collections::HashSet;
use std::path::Path;

use super::error::ConfigError;
use super::types::{PlanConfig, TimerConfig};

/// Loader for YAML configuration files.
pub struct YamlLoader;

impl YamlLoader {
    /// Load timer settings from a file.
    pub fn load_timer_config(path: impl AsRef<Path>) -> Result<TimerConfig, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_timer_config(&content)
    }

    /// Parse timer settings from a YAML string.
    pub fn parse_timer_config(yaml: &str) -> Result<TimerConfig, ConfigError> {
        let config: TimerConfig = serde_yaml::from_str(yaml)?;
        Self::validate_timer_config(&config)?;
        Ok(config)
    }

    /// Load a task plan from a file.
    pub fn load_plan(path: impl AsRef<Path>) -> Result<PlanConfig, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_plan(&content)
    }

    /// Parse a task plan from a YAML string.
    pub fn parse_plan(yaml: &str) -> Result<PlanConfig, ConfigError> {
        let plan: PlanConfig = serde_yaml::from_str(yaml)?;
        Self::validate_plan(&plan)?;
        Ok(plan)
    }

    fn validate_timer_config(config: &TimerConfig) -> Result<(), ConfigError> {
        if config.thread_name.is_empty() {
            return Err(ConfigError::MissingField("thread_name".into()));
        }

        // std refuses names with interior NULs when spawning
        if config.thread_name.contains('\0') {
            return Err(ConfigError::InvalidConfig(
                "thread_name cannot contain NUL bytes".into(),
            ));
        }

        if config.stack_size == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "stack_size cannot be zero".into(),
            ));
        }

        Ok(())
    }

    /// Validate a task plan.
    pub fn validate_plan(plan: &PlanConfig) -> Result<(), ConfigError> {
        Self::validate_timer_config(&plan.timer)?;

        let mut names: HashSet<&str> = HashSet::new();
        for task in &plan.tasks {
            if task.name.is_empty() {
                return Err(ConfigError::MissingField("name".into()));
            }

            if !names.insert(&task.name) {
                return Err(ConfigError::InvalidConfig(format!(
                    "duplicate task name: {}",
                    task.name
                )));
            }

            if task.every_ms == Some(0) {
                return Err(ConfigError::InvalidConfig(format!(
                    "task '{}': every_ms cannot be zero, omit it for a one-shot task",
                    task.name
                )));
            }
        }

        Ok(())
    }
}
