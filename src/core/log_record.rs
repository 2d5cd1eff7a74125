//! Encoded log record

use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

/// Call site of a log statement, captured by the logging macros
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
    pub module_path: &'static str,
}

impl SourceLocation {
    pub const fn new(file: &'static str, line: u32, module_path: &'static str) -> Self {
        Self {
            file,
            line,
            module_path,
        }
    }
}

/// A finalized record: metadata plus the exact bytes the sink will write.
///
/// Records are moved from the encoder through the queue to the sink and are
/// never mutated after construction.
#[derive(Debug, Clone)]
pub struct LogRecord {
    timestamp: DateTime<Utc>,
    monotonic: Instant,
    level: LogLevel,
    logger_name: Arc<str>,
    payload: Box<[u8]>,
    message_start: usize,
    format_failed: bool,
}

impl LogRecord {
    pub(crate) fn from_parts(
        timestamp: DateTime<Utc>,
        monotonic: Instant,
        level: LogLevel,
        logger_name: Arc<str>,
        payload: Box<[u8]>,
        message_start: usize,
        format_failed: bool,
    ) -> Self {
        debug_assert!(message_start <= payload.len());
        Self {
            timestamp,
            monotonic,
            level,
            logger_name,
            payload,
            message_start,
            format_failed,
        }
    }

    #[inline]
    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    #[inline]
    pub fn monotonic(&self) -> Instant {
        self.monotonic
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    #[inline]
    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    /// The full line including the trailing newline
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The (sanitized) message text without prefix or newline
    pub fn message(&self) -> &str {
        let end = self.payload.len().saturating_sub(1).max(self.message_start);
        // The payload is built from a `String`, so the slice is valid UTF-8.
        std::str::from_utf8(&self.payload[self.message_start..end]).unwrap_or_default()
    }

    /// The line as text, without the trailing newline
    pub fn line(&self) -> &str {
        let end = self.payload.len().saturating_sub(1);
        std::str::from_utf8(&self.payload[..end]).unwrap_or_default()
    }

    /// Whether the message was replaced by the format error marker
    #[inline]
    pub fn format_failed(&self) -> bool {
        self.format_failed
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, message_start: usize) -> LogRecord {
        LogRecord::from_parts(
            Utc::now(),
            Instant::now(),
            LogLevel::Warn,
            Arc::from("unit"),
            text.as_bytes().to_vec().into_boxed_slice(),
            message_start,
            false,
        )
    }

    #[test]
    fn test_message_and_line_views() {
        let rec = record("[t] [WARN] disk low\n", 11);
        assert_eq!(rec.message(), "disk low");
        assert_eq!(rec.line(), "[t] [WARN] disk low");
        assert_eq!(rec.len(), 20);
        assert_eq!(rec.level(), LogLevel::Warn);
        assert_eq!(rec.logger_name(), "unit");
    }

    #[test]
    fn test_empty_message() {
        let rec = record("[t] [WARN] \n", 11);
        assert_eq!(rec.message(), "");
    }
}
