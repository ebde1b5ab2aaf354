use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("batch.{0} must be at least 1")]
    Zero(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub batch: Batch,
    #[serde(default)]
    pub intervals: Intervals,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.batch.validate()
    }
}

/// Bounds of one accumulation loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Batch {
    pub target_count: usize,
    pub max_attempts: u32,
    pub max_consecutive_failures: u32,
    pub page_limit: u8,
}

impl Batch {
    /// A zero bound would end every accumulation before its first fetch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = [
            ("target_count", self.target_count),
            ("max_attempts", self.max_attempts as usize),
            ("max_consecutive_failures", self.max_consecutive_failures as usize),
            ("page_limit", usize::from(self.page_limit)),
        ];
        match bounds.into_iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ConfigError::Zero(name)),
            None => Ok(()),
        }
    }
}

impl Default for Batch {
    fn default() -> Self {
        Self {
            target_count: 10,
            max_attempts: 5,
            max_consecutive_failures: 3,
            page_limit: 30,
        }
    }
}

/// Intervals in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Intervals {
    pub load_more: u64,
    pub retry_backoff: u64,
}

impl Intervals {
    pub fn load_more(&self) -> Duration {
        Duration::from_millis(self.load_more)
    }
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff)
    }
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            load_more: 1000,
            retry_backoff: 250,
        }
    }
}
