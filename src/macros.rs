//! Logging macros for ergonomic log message formatting.
//!
//! These macros build the message with `format_args!`, so nothing is rendered
//! unless the level passes the logger's threshold. They record the call site
//! (shown when the logger has source locations enabled) and discard the
//! result; call [`Logger::log_args`](crate::Logger::log_args) directly to
//! observe queue-full or closed errors.
//!
//! # Examples
//!
//! ```
//! use rust_fast_logger::prelude::*;
//! use rust_fast_logger::info;
//!
//! let logger = Logger::builder("macros-doc")
//!     .sink(Box::new(NullSink::new()))
//!     .build()
//!     .unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_fast_logger::prelude::*;
/// # let logger = Logger::builder("log-macro-doc").sink(Box::new(NullSink::new())).build().unwrap();
/// use rust_fast_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let _ = $logger.log_args(
            $level,
            ::std::format_args!($($arg)+),
            ::std::option::Option::Some($crate::SourceLocation::new(
                ::std::file!(),
                ::std::line!(),
                ::std::module_path!(),
            )),
        );
    }};
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use rust_fast_logger::prelude::*;
/// # let logger = Logger::builder("trace-macro-doc").sink(Box::new(NullSink::new())).build().unwrap();
/// # logger.set_level(LogLevel::Trace);
/// use rust_fast_logger::trace;
/// trace!(logger, "Entering function: calculate()");
/// trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_fast_logger::prelude::*;
/// # let logger = Logger::builder("warn-macro-doc").sink(Box::new(NullSink::new())).build().unwrap();
/// use rust_fast_logger::warn;
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message.
///
/// # Examples
///
/// ```
/// # use rust_fast_logger::prelude::*;
/// # let logger = Logger::builder("critical-macro-doc").sink(Box::new(NullSink::new())).build().unwrap();
/// use rust_fast_logger::critical;
/// critical!(logger, "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $($arg)+)
    };
}
