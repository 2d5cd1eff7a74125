//! Sink that discards everything, for measuring the engine without I/O cost

use crate::core::{LogRecord, LoggerError, Result};
use crate::sinks::Sink;

#[derive(Debug, Default)]
pub struct NullSink {
    records: u64,
    bytes: u64,
    closed: bool,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Sink for NullSink {
    fn write(&mut self, record: &LogRecord) -> Result<()> {
        if self.closed {
            return Err(LoggerError::SinkClosed);
        }
        self.records += 1;
        self.bytes += record.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn name(&self) -> &str {
        "null"
    }
}
