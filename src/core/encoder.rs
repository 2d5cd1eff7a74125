//! Message encoder: renders a log call into the final line bytes
//!
//! Output layout:
//!
//! ```text
//! [2025-01-08T10:30:45.123Z] [INFO] message
//! [2025-01-08T10:30:45.123Z] [INFO] [src/main.rs:42] message   (source info enabled)
//! ```
//!
//! The encoder holds only immutable configuration, so a single instance can be
//! shared by every producer thread without synchronization.

use super::log_level::LogLevel;
use super::log_record::{LogRecord, SourceLocation};
use super::timestamp::TimestampFormat;
use chrono::{DateTime, Utc};
use std::fmt::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Written in place of a message whose arguments failed to render
pub const FORMAT_ERROR_MARKER: &str = "<format error>";

/// Bytes reserved for `[timestamp] [CRITICAL] ` before the message
const PREFIX_RESERVE: usize = 48;

#[derive(Debug, Clone, Default)]
pub struct Encoder {
    timestamp_format: TimestampFormat,
    source_location: bool,
}

/// A line under construction, with the clocks read once at its start
struct Line {
    buf: String,
    timestamp: DateTime<Utc>,
    monotonic: Instant,
    message_start: usize,
}

impl Encoder {
    pub fn new(timestamp_format: TimestampFormat, source_location: bool) -> Self {
        Self {
            timestamp_format,
            source_location,
        }
    }

    pub fn timestamp_format(&self) -> &TimestampFormat {
        &self.timestamp_format
    }

    pub fn source_location(&self) -> bool {
        self.source_location
    }

    /// Encode pre-built text.
    pub fn encode_text(
        &self,
        logger_name: &Arc<str>,
        level: LogLevel,
        text: &str,
        location: Option<&SourceLocation>,
    ) -> LogRecord {
        let mut line = self.start_line(level, location, text.len());
        push_sanitized(&mut line.buf, text);
        finish(line, logger_name, level, false)
    }

    /// Encode a format template with its arguments.
    ///
    /// A failing or panicking `Display` impl does not reach the caller: the
    /// message is replaced with [`FORMAT_ERROR_MARKER`] and the returned
    /// record reports `format_failed() == true`.
    pub fn encode(
        &self,
        logger_name: &Arc<str>,
        level: LogLevel,
        args: fmt::Arguments<'_>,
        location: Option<&SourceLocation>,
    ) -> LogRecord {
        if let Some(text) = args.as_str() {
            return self.encode_text(logger_name, level, text, location);
        }

        let (message, failed) = match render_args(args) {
            Some(message) => (message, false),
            None => (FORMAT_ERROR_MARKER.to_string(), true),
        };

        let mut line = self.start_line(level, location, message.len());
        push_sanitized(&mut line.buf, &message);
        finish(line, logger_name, level, failed)
    }

    fn start_line(
        &self,
        level: LogLevel,
        location: Option<&SourceLocation>,
        message_len: usize,
    ) -> Line {
        let timestamp = Utc::now();
        let monotonic = Instant::now();
        let mut buf = String::with_capacity(PREFIX_RESERVE + message_len + 1);

        buf.push('[');
        if self.timestamp_format.write_into(&mut buf, &timestamp).is_err() {
            // Custom patterns are validated up front; keep the line parseable anyway.
            buf.truncate(1);
            let _ = TimestampFormat::Iso8601.write_into(&mut buf, &timestamp);
        }
        buf.push_str("] [");
        buf.push_str(level.to_str());
        buf.push_str("] ");

        if self.source_location {
            if let Some(location) = location {
                let _ = write!(buf, "[{}:{}] ", location.file, location.line);
            }
        }

        let message_start = buf.len();
        Line {
            buf,
            timestamp,
            monotonic,
            message_start,
        }
    }
}

fn finish(line: Line, logger_name: &Arc<str>, level: LogLevel, failed: bool) -> LogRecord {
    let Line {
        mut buf,
        timestamp,
        monotonic,
        message_start,
    } = line;
    buf.push('\n');
    LogRecord::from_parts(
        timestamp,
        monotonic,
        level,
        Arc::clone(logger_name),
        buf.into_bytes().into_boxed_slice(),
        message_start,
        failed,
    )
}

/// Render arguments, returning `None` if any `Display` impl errors or panics.
fn render_args(args: fmt::Arguments<'_>) -> Option<String> {
    let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut message = String::with_capacity(64);
        fmt::write(&mut message, args).map(|()| message)
    }));
    match rendered {
        Ok(Ok(message)) => Some(message),
        Ok(Err(_)) | Err(_) => None,
    }
}

/// Append `text`, escaping characters that would split the record across lines
fn push_sanitized(buf: &mut String, text: &str) {
    if !text.contains(['\n', '\r', '\t']) {
        buf.push_str(text);
        return;
    }
    for c in text.chars() {
        match c {
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            other => buf.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl fmt::Display for Failing {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    struct Panicking;

    impl fmt::Display for Panicking {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("display exploded")
        }
    }

    fn name() -> Arc<str> {
        Arc::from("encoder-test")
    }

    #[test]
    fn test_line_layout() {
        let encoder = Encoder::new(TimestampFormat::UnixMillis, false);
        let record = encoder.encode_text(&name(), LogLevel::Info, "hello", None);
        let line = record.line();

        assert!(line.starts_with('['));
        assert!(line.ends_with("] [INFO] hello"));
        assert_eq!(record.payload().last(), Some(&b'\n'));
        assert_eq!(record.message(), "hello");
        assert!(!record.format_failed());
    }

    #[test]
    fn test_format_arguments() {
        let encoder = Encoder::default();
        let record = encoder.encode(
            &name(),
            LogLevel::Warn,
            format_args!("retry {} of {}", 3, 5),
            None,
        );
        assert_eq!(record.message(), "retry 3 of 5");
        assert!(record.line().contains("] [WARN] retry 3 of 5"));
    }

    #[test]
    fn test_display_error_degrades_to_marker() {
        let encoder = Encoder::default();
        let record = encoder.encode(&name(), LogLevel::Error, format_args!("value={}", Failing), None);
        assert!(record.format_failed());
        assert_eq!(record.message(), FORMAT_ERROR_MARKER);
    }

    #[test]
    fn test_display_panic_degrades_to_marker() {
        let encoder = Encoder::default();
        let record = encoder.encode(&name(), LogLevel::Error, format_args!("{}", Panicking), None);
        assert!(record.format_failed());
        assert_eq!(record.message(), FORMAT_ERROR_MARKER);
    }

    #[test]
    fn test_newlines_are_escaped() {
        let encoder = Encoder::default();
        let record = encoder.encode_text(&name(), LogLevel::Info, "a\nb\rc\td", None);
        assert_eq!(record.message(), "a\\nb\\rc\\td");
        assert_eq!(record.payload().iter().filter(|b| **b == b'\n').count(), 1);
    }

    #[test]
    fn test_source_location_rendering() {
        let location = SourceLocation::new("src/main.rs", 42, "app");

        let with = Encoder::new(TimestampFormat::Unix, true);
        let record = with.encode_text(&name(), LogLevel::Debug, "here", Some(&location));
        assert!(record.line().ends_with("[DEBUG] [src/main.rs:42] here"));
        assert_eq!(record.message(), "here");

        let without = Encoder::new(TimestampFormat::Unix, false);
        let record = without.encode_text(&name(), LogLevel::Debug, "here", Some(&location));
        assert!(record.line().ends_with("[DEBUG] here"));
    }

    #[test]
    fn test_large_message_is_intact() {
        let encoder = Encoder::default();
        let text = "x".repeat(20_000);
        let record = encoder.encode_text(&name(), LogLevel::Info, &text, None);
        assert_eq!(record.message().len(), 20_000);
        assert_eq!(record.message(), text);
    }
}
