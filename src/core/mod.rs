//! Core logger types and traits

pub mod config;
pub mod encoder;
pub mod error;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod overflow_policy;
pub mod registry;
pub mod timestamp;
pub mod worker;

pub use config::{AsyncConfig, LoggerConfig};
pub use encoder::{Encoder, FORMAT_ERROR_MARKER};
pub use error::{LoggerError, Result};
pub use log_level::LogLevel;
pub use log_record::{LogRecord, SourceLocation};
pub use logger::{Logger, LoggerBuilder, DEFAULT_SHUTDOWN_TIMEOUT};
pub use metrics::LoggerMetrics;
pub use overflow_policy::{OverflowCallback, OverflowPolicy};
pub use timestamp::TimestampFormat;
pub use worker::WorkerState;
