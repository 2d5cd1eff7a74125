//! Logger construction parameters
//!
//! Async behaviour is part of each logger's configuration and captured when
//! the logger is built; there is no process-wide async switch.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::overflow_policy::OverflowPolicy;
use super::timestamp::TimestampFormat;
use crate::queue::{validate_capacity, DEFAULT_QUEUE_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Queue settings for an async logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsyncConfig {
    /// Slot count of the bounded queue; a power of two
    pub queue_capacity: usize,
    pub overflow_policy: OverflowPolicy,
}

impl AsyncConfig {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            queue_capacity,
            overflow_policy: OverflowPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_capacity(self.queue_capacity)
    }
}

impl Default for AsyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

/// Serializable description of a file logger
///
/// # Example
///
/// ```
/// use rust_fast_logger::LoggerConfig;
///
/// let config = LoggerConfig::from_json_str(r#"{
///     "name": "speedlogger",
///     "filename": "speedlog.log",
///     "truncate": false,
///     "multithreaded": false,
///     "async_mode": { "queue_capacity": 16777216 }
/// }"#).unwrap();
///
/// assert!(config.async_mode.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub name: String,
    pub filename: PathBuf,
    #[serde(default)]
    pub truncate: bool,
    #[serde(default = "default_multithreaded")]
    pub multithreaded: bool,
    #[serde(default)]
    pub min_level: LogLevel,
    #[serde(default)]
    pub timestamp_format: TimestampFormat,
    #[serde(default)]
    pub source_location: bool,
    /// `None` selects synchronous mode
    #[serde(default)]
    pub async_mode: Option<AsyncConfig>,
}

fn default_multithreaded() -> bool {
    true
}

impl LoggerConfig {
    pub fn new(name: impl Into<String>, filename: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            truncate: false,
            multithreaded: default_multithreaded(),
            min_level: LogLevel::default(),
            timestamp_format: TimestampFormat::default(),
            source_location: false,
            async_mode: None,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation("reading logger config", path.display().to_string(), e)
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if self.filename.as_os_str().is_empty() {
            return Err(LoggerError::config("LoggerConfig", "filename must not be empty"));
        }
        self.timestamp_format.validate()?;
        if let Some(async_config) = &self.async_mode {
            async_config.validate()?;
        }
        Ok(())
    }
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LoggerError::config("Logger", "name must not be empty"));
    }
    Ok(())
}
