//! Engine configuration.

use crudkit_core::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_retry_attempts() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_log_queries() -> bool {
    true
}

/// Behaviour of a [`QueryEngine`](crate::QueryEngine) around execution.
///
/// Every field has a default, so an empty JSON object is a valid config:
///
/// ```
/// use crudkit::EngineConfig;
///
/// let config = EngineConfig::from_json_str(r#"{ "retry_attempts": 3 }"#).unwrap();
/// assert_eq!(config.retry_attempts, 3);
/// assert_eq!(config.retry_delay_ms, 1000);
/// assert!(config.log_queries);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Attempts per statement, including the first one
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Fixed pause between attempts, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Send a debug line to the log sink for every statement
    #[serde(default = "default_log_queries")]
    pub log_queries: bool,
    /// Callers whose statements are never logged.
    ///
    /// An entry matches a caller tag exactly, a source file path, or a
    /// `file:line` location.
    #[serde(default)]
    pub quiet_callers: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            log_queries: default_log_queries(),
            quiet_callers: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON.
    #[allow(clippy::result_large_err)]
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            Error::Config(ConfigError {
                message: format!("invalid engine config: {}", e),
                source: Some(Box::new(e)),
            })
        })
    }

    /// Read and parse a JSON config file.
    #[allow(clippy::result_large_err)]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(ConfigError {
                message: format!("cannot read engine config {}: {}", path.display(), e),
                source: Some(Box::new(e)),
            })
        })?;
        Self::from_json_str(&json)
    }

    /// Set the number of attempts per statement.
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Set the pause between attempts.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enable or disable per-statement debug logging.
    pub fn log_queries(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    /// Add a caller to the quiet set.
    pub fn quiet_caller(mut self, caller: impl Into<String>) -> Self {
        self.quiet_callers.push(caller.into());
        self
    }

    /// Attempts to make, never less than one.
    pub fn attempts(&self) -> u32 {
        self.retry_attempts.max(1)
    }

    /// The pause between attempts.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
