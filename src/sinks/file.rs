//! File sink implementation

use crate::core::{LogRecord, LoggerError, Result};
use crate::sinks::Sink;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

const BUFFER_SIZE: usize = 64 * 1024;

/// Append-only file sink holding an exclusive advisory lock on its file
///
/// A write-through sink hands every record to the OS before `write` returns.
/// A buffered sink collects up to 64 KiB first; [`Sink::pending`] reports how
/// many records are waiting, and a failed flush discards them.
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    truncate: bool,
    write_through: bool,
    position: u64,
    pending: u64,
    lost_records: u64,
}

impl FileSink {
    /// Open `path` for write-through logging, truncating it or appending to it.
    ///
    /// # Errors
    ///
    /// - [`LoggerError::IoOperation`] if the file cannot be opened for writing
    /// - [`LoggerError::FileLockError`] if another writer holds the file
    pub fn open(path: impl Into<PathBuf>, truncate: bool) -> Result<Self> {
        Self::open_with(path.into(), truncate, true)
    }

    /// Open `path` with a write buffer, for a single background writer.
    pub fn open_buffered(path: impl Into<PathBuf>, truncate: bool) -> Result<Self> {
        Self::open_with(path.into(), truncate, false)
    }

    fn open_with(path: PathBuf, truncate: bool, write_through: bool) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.create(true);
        if truncate {
            options.write(true);
        } else {
            options.append(true);
        }

        let file = options.open(&path).map_err(|e| {
            LoggerError::io_operation("opening log file", path.display().to_string(), e)
        })?;

        if file.try_lock_exclusive().is_err() {
            return Err(LoggerError::file_lock(path.display().to_string()));
        }

        // Truncate only once the lock is held, never under another writer.
        if truncate {
            file.set_len(0).map_err(|e| {
                LoggerError::io_operation("truncating log file", path.display().to_string(), e)
            })?;
        }

        let position = file
            .metadata()
            .map_err(|e| {
                LoggerError::io_operation("reading log file metadata", path.display().to_string(), e)
            })?
            .len();

        Ok(Self {
            path,
            writer: Some(BufWriter::with_capacity(BUFFER_SIZE, file)),
            truncate,
            write_through,
            position,
            pending: 0,
            lost_records: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn truncate(&self) -> bool {
        self.truncate
    }

    pub fn is_write_through(&self) -> bool {
        self.write_through
    }

    /// Byte offset the next record will be written at
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Records dropped because of a fatal write error, buffered ones included
    pub fn lost_records(&self) -> u64 {
        self.lost_records
    }

    /// Throw away the buffer after a fatal error and release the file.
    fn discard(&mut self, operation: &str, lost: u64, error: io::Error) -> LoggerError {
        if let Some(writer) = self.writer.take() {
            let (file, _unwritten) = writer.into_parts();
            let _ = FileExt::unlock(&file);
        }
        self.pending = 0;
        self.lost_records += lost;
        LoggerError::io_operation(operation, self.path.display().to_string(), error)
    }
}

impl Sink for FileSink {
    fn write(&mut self, record: &LogRecord) -> Result<()> {
        let payload = record.payload();
        let needs_room = match &self.writer {
            Some(writer) => {
                !writer.buffer().is_empty()
                    && writer.buffer().len() + payload.len() > writer.capacity()
            }
            None => return Err(LoggerError::SinkClosed),
        };
        // Flush on our own so the pending count stays exact.
        if needs_room {
            if let Err(e) = self.flush() {
                self.lost_records += 1;
                return Err(e);
            }
        }

        let writer = self.writer.as_mut().ok_or(LoggerError::SinkClosed)?;
        let mut written = write_fully(writer, payload);
        if written.is_ok() && self.write_through {
            written = writer.flush();
        }

        match written {
            Ok(()) => {
                self.position += payload.len() as u64;
                self.pending = if writer.buffer().is_empty() {
                    0
                } else {
                    self.pending + 1
                };
                Ok(())
            }
            Err(e) => {
                let lost = self.pending + 1;
                Err(self.discard("writing log record", lost, e))
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(LoggerError::SinkClosed)?;
        match writer.flush() {
            Ok(()) => {
                self.pending = 0;
                Ok(())
            }
            Err(e) => {
                let lost = self.pending;
                Err(self.discard("flushing log file", lost, e))
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.writer.is_none() {
            return Ok(());
        }
        self.flush()?;

        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let (file, _) = writer.into_parts();
        let synced = file.sync_data();
        let _ = FileExt::unlock(&file);

        synced.map_err(|e| {
            LoggerError::io_operation("closing log file", self.path.display().to_string(), e)
        })
    }

    fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    fn pending(&self) -> u64 {
        self.pending
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.close();
    }
}

/// Write all of `buf`, continuing after short writes.
///
/// `Interrupted` is retried; a zero-length write is reported as `WriteZero`.
/// Any other error aborts the write.
pub fn write_fully<W: Write + ?Sized>(writer: &mut W, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match writer.write(buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    "sink accepted zero bytes of a pending record",
                ))
            }
            Ok(n) => buf = &buf[n..],
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
