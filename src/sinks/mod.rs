//! Output sinks
//!
//! A logger owns exactly one sink. It is touched by a single thread at a time:
//! the calling thread in sync mode, the worker thread in async mode.

pub mod file;
pub mod null;
pub mod test_sink;

pub use file::{write_fully, FileSink};
pub use null::NullSink;
pub use test_sink::TestSink;

use crate::core::{LogRecord, Result};

/// Destination byte stream for encoded records
pub trait Sink: Send {
    /// Write one complete record.
    ///
    /// Either the whole payload is accepted or an error is returned; a
    /// partially written record is never reported as success.
    fn write(&mut self, record: &LogRecord) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    /// Flush and release the underlying resource. Idempotent.
    fn close(&mut self) -> Result<()>;

    /// Records accepted by `write` but still held in a user-space buffer.
    ///
    /// A failed `write`, `flush` or `close` discards them along with the
    /// failing record, so callers count them as lost.
    fn pending(&self) -> u64 {
        0
    }

    fn is_closed(&self) -> bool;

    fn name(&self) -> &str;
}
