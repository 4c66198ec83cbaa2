//! Configuration for vertebra

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What a placeholder action does when it is invoked before a handler exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnboundPolicy {
    /// Reject the call
    Fail,
    /// Queue the call and replay it once a handler is bound
    Defer,
}

impl Default for UnboundPolicy {
    fn default() -> Self {
        UnboundPolicy::Fail
    }
}

/// Spine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpineConfig {
    /// Buffered events per subscriber before it lags
    pub event_capacity: usize,
}

impl Default for SpineConfig {
    fn default() -> Self {
        Self {
            event_capacity: 1024,
        }
    }
}

/// Action registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    /// Behavior of placeholder actions invoked before binding
    pub unbound_policy: UnboundPolicy,
    /// Maximum queued calls per placeholder under [`UnboundPolicy::Defer`]
    pub max_deferred_calls: usize,
    /// Buffered registry events per subscriber
    pub event_capacity: usize,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            unbound_policy: UnboundPolicy::Fail,
            max_deferred_calls: 64,
            event_capacity: 256,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VertebraConfig {
    pub spine: SpineConfig,
    pub actions: ActionsConfig,
    pub logging: LoggingConfig,
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl VertebraConfig {
    /// Load configuration from a JSON or TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_str(&content)
    }

    /// Load configuration from a string, trying JSON first and then TOML
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        if let Ok(config) = serde_json::from_str::<VertebraConfig>(content) {
            return Ok(config);
        }

        toml::from_str::<VertebraConfig>(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Defaults with `VERTEBRA_*` environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply `VERTEBRA_*` environment overrides on top of `self`
    pub fn apply_env(&mut self) {
        if let Ok(level) = std::env::var("VERTEBRA_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(capacity) = std::env::var("VERTEBRA_EVENT_CAPACITY") {
            if let Ok(c) = capacity.parse::<usize>() {
                self.spine.event_capacity = c;
            }
        }

        if let Ok(policy) = std::env::var("VERTEBRA_UNBOUND_POLICY") {
            match policy.to_ascii_lowercase().as_str() {
                "fail" => self.actions.unbound_policy = UnboundPolicy::Fail,
                "defer" => self.actions.unbound_policy = UnboundPolicy::Defer,
                _ => {}
            }
        }

        if let Ok(max) = std::env::var("VERTEBRA_MAX_DEFERRED_CALLS") {
            if let Ok(m) = max.parse::<usize>() {
                self.actions.max_deferred_calls = m;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spine.event_capacity == 0 {
            return Err(ConfigError::Invalid(
                "spine.event_capacity must be greater than 0".to_string(),
            ));
        }

        if self.actions.event_capacity == 0 {
            return Err(ConfigError::Invalid(
                "actions.event_capacity must be greater than 0".to_string(),
            ));
        }

        if self.actions.unbound_policy == UnboundPolicy::Defer && self.actions.max_deferred_calls == 0 {
            return Err(ConfigError::Invalid(
                "actions.max_deferred_calls must be greater than 0 when deferring".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Unknown log level '{}'",
                self.logging.level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = VertebraConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.actions.unbound_policy, UnboundPolicy::Fail);
    }

    #[test]
    fn test_partial_toml() {
        let config = VertebraConfig::from_str(
            r#"
            [actions]
            unbound_policy = "defer"
            max_deferred_calls = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.actions.unbound_policy, UnboundPolicy::Defer);
        assert_eq!(config.actions.max_deferred_calls, 8);
        assert_eq!(config.spine.event_capacity, 1024);
    }

    #[test]
    fn test_json() {
        let config = VertebraConfig::from_str(r#"{"logging": {"level": "debug"}}"#).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(
            VertebraConfig::from_str("[[[not valid"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = VertebraConfig::default();
        config.spine.event_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = VertebraConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = VertebraConfig::default();
        config.actions.unbound_policy = UnboundPolicy::Defer;
        config.actions.max_deferred_calls = 0;
        assert!(config.validate().is_err());
    }
}
