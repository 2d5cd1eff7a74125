//! # Rust Fast Logger
//!
//! A high-throughput file logging engine. Each logger writes finalized,
//! single-line records to one sink, either directly from the calling thread
//! or through a bounded lock-free queue drained by a background worker.
//!
//! ## Features
//!
//! - **Sync or async**: chosen per logger at construction time
//! - **Back-pressure**: block, block with timeout, drop newest or overwrite oldest
//! - **Fail-soft formatting**: a broken `Display` impl never reaches the caller
//! - **Named loggers**: a process-wide registry keyed by logger name
//!
//! ```
//! use rust_fast_logger::prelude::*;
//! use rust_fast_logger::info;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let logger = Logger::builder("crate-doc")
//!     .file(dir.path().join("app.log"))
//!     .async_queue(1024)
//!     .build()
//!     .unwrap();
//!
//! info!(logger, "listening on port {}", 8080);
//! logger.close().unwrap();
//! ```

pub mod core;
pub mod macros;
pub mod queue;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        AsyncConfig, LogLevel, Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics,
        OverflowCallback, OverflowPolicy, Result, TimestampFormat, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::sinks::{FileSink, NullSink, Sink};
}

pub use crate::core::{
    registry, AsyncConfig, Encoder, LogLevel, LogRecord, Logger, LoggerBuilder, LoggerConfig,
    LoggerError, LoggerMetrics, OverflowCallback, OverflowPolicy, Result, SourceLocation,
    TimestampFormat, WorkerState, DEFAULT_SHUTDOWN_TIMEOUT, FORMAT_ERROR_MARKER,
};
pub use crate::queue::{BoundedQueue, Pushed, DEFAULT_QUEUE_CAPACITY, HIGH_THROUGHPUT_QUEUE_CAPACITY};
pub use crate::sinks::{FileSink, NullSink, Sink, TestSink};
