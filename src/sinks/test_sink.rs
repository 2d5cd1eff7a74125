//! In-memory sink for assertions in tests
//!
//! Cloning a `TestSink` yields another handle onto the same capture buffer,
//! so a test can keep one handle while the logger owns the other.

use crate::core::{LogRecord, LoggerError, Result};
use crate::sinks::Sink;
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Shared {
    lines: Mutex<Vec<String>>,
    flushes: AtomicU64,
    closes: AtomicU64,
    fail_after: Mutex<Option<usize>>,
}

#[derive(Debug, Clone, Default)]
pub struct TestSink {
    shared: Arc<Shared>,
    closed: Arc<AtomicBool>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write once `count` records have been accepted
    #[must_use]
    pub fn failing_after(self, count: usize) -> Self {
        *self.shared.fail_after.lock() = Some(count);
        self
    }

    /// Captured lines, without trailing newlines
    pub fn lines(&self) -> Vec<String> {
        self.shared.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.shared.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn flush_count(&self) -> u64 {
        self.shared.flushes.load(Ordering::SeqCst)
    }

    /// Number of `close` calls that actually closed the sink
    pub fn close_count(&self) -> u64 {
        self.shared.closes.load(Ordering::SeqCst)
    }
}

impl Sink for TestSink {
    fn write(&mut self, record: &LogRecord) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LoggerError::SinkClosed);
        }

        let mut lines = self.shared.lines.lock();
        if let Some(limit) = *self.shared.fail_after.lock() {
            if lines.len() >= limit {
                return Err(LoggerError::io_operation(
                    "writing log record",
                    "test sink",
                    io::Error::new(io::ErrorKind::Other, "injected failure"),
                ));
            }
        }
        lines.push(record.line().to_string());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LoggerError::SinkClosed);
        }
        self.shared.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.shared.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "test"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Encoder, LogLevel};

    fn record(text: &str) -> LogRecord {
        Encoder::default().encode_text(&Arc::from("sink-test"), LogLevel::Info, text, None)
    }

    #[test]
    fn test_captures_through_clone() {
        let probe = TestSink::new();
        let mut sink = probe.clone();
        sink.write(&record("one")).unwrap();
        sink.write(&record("two")).unwrap();

        let lines = probe.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("one"));
        assert!(lines[1].ends_with("two"));
    }

    #[test]
    fn test_injected_failure() {
        let mut sink = TestSink::new().failing_after(1);
        assert!(sink.write(&record("kept")).is_ok());
        let err = sink.write(&record("lost")).unwrap_err();
        assert!(err.is_io());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_close_counts_once() {
        let probe = TestSink::new();
        let mut sink = probe.clone();
        sink.close().unwrap();
        sink.close().unwrap();
        assert_eq!(probe.close_count(), 1);
        assert!(matches!(sink.write(&record("late")), Err(LoggerError::SinkClosed)));
    }
}
