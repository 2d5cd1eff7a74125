//! Logger facade
//!
//! A [`Logger`] is a cheap, cloneable handle. In sync mode the calling thread
//! encodes the record and writes it to the sink under a lock. In async mode it
//! encodes the record and pushes it into a bounded queue drained by a
//! dedicated worker thread.

use super::{
    config::{validate_name, AsyncConfig, LoggerConfig},
    encoder::Encoder,
    error::{LoggerError, Result},
    log_level::LogLevel,
    log_record::{LogRecord, SourceLocation},
    metrics::LoggerMetrics,
    overflow_policy::{OverflowCallback, OverflowPolicy},
    registry,
    timestamp::TimestampFormat,
    worker::{AsyncWorker, WorkerShared, WorkerState},
};
use crate::queue::{BoundedQueue, Pushed};
use crate::sinks::{FileSink, Sink};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default shutdown timeout for logger cleanup (5 seconds)
///
/// This timeout is used when the last handle is dropped without an explicit
/// [`Logger::close`]. Change it with [`LoggerBuilder::shutdown_timeout`], or
/// use [`Logger::close_timeout`] for a one-off bound.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Drops between two repeated overflow warnings
const OVERFLOW_ALERT_INTERVAL: u64 = 1000;

#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

pub(crate) struct LoggerInner {
    name: Arc<str>,
    level: AtomicU8,
    encoder: Encoder,
    multithreaded: bool,
    mode: Mode,
    metrics: Arc<LoggerMetrics>,
    on_overflow: Option<OverflowCallback>,
    shutdown_timeout: Duration,
    closed: AtomicBool,
    format_failure_reported: AtomicBool,
    contention_reported: AtomicBool,
}

enum Mode {
    Sync(Mutex<SyncWriter>),
    Async(AsyncState),
}

struct SyncWriter {
    sink: Box<dyn Sink>,
    /// Set by the first fatal write error; later records are lost
    failure: Option<String>,
}

struct AsyncState {
    queue: Arc<BoundedQueue<LogRecord>>,
    worker: AsyncWorker,
    shared: Arc<WorkerShared>,
}

impl Logger {
    /// Create a builder for a logger registered under `name`
    ///
    /// # Example
    /// ```
    /// use rust_fast_logger::prelude::*;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let logger = Logger::builder("builder-doc")
    ///     .file(dir.path().join("app.log"))
    ///     .min_level(LogLevel::Debug)
    ///     .async_queue(1024)
    ///     .build()
    ///     .unwrap();
    ///
    /// logger.debug("ready").unwrap();
    /// logger.close().unwrap();
    /// ```
    #[must_use]
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }

    /// Build a logger from a (deserialized) configuration.
    pub fn from_config(config: LoggerConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = LoggerBuilder::new(config.name)
            .file(config.filename)
            .truncate(config.truncate)
            .multithreaded(config.multithreaded)
            .min_level(config.min_level)
            .timestamp_format(config.timestamp_format)
            .source_location(config.source_location);
        if let Some(async_config) = config.async_mode {
            builder = builder.async_mode(async_config);
        }
        builder.build()
    }

    /// Synchronous file logger with default settings
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>, truncate: bool) -> Result<Self> {
        LoggerBuilder::new(name).file(path).truncate(truncate).build()
    }

    pub(crate) fn from_inner(inner: Arc<LoggerInner>) -> Self {
        Self { inner }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.inner.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: LogLevel) {
        self.inner.level.store(level.as_u8(), Ordering::Relaxed);
    }

    /// Whether a record at `level` would be encoded
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.inner.enabled(level)
    }

    pub fn is_async(&self) -> bool {
        matches!(self.inner.mode, Mode::Async(_))
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// State of the background worker; `None` for a sync logger
    pub fn worker_state(&self) -> Option<WorkerState> {
        match &self.inner.mode {
            Mode::Sync(_) => None,
            Mode::Async(state) => Some(state.shared.state()),
        }
    }

    /// Log pre-built text.
    ///
    /// # Errors
    ///
    /// - [`LoggerError::LoggerClosed`] after [`Logger::close`]
    /// - [`LoggerError::QueueFull`] if the queue policy dropped the record
    /// - [`LoggerError::WriterFailed`] or the sink's error once writing has failed
    ///
    /// A message that fails to format is not an error: it is written with
    /// the format error marker instead.
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) -> Result<()> {
        let inner = &*self.inner;
        inner.check_open()?;
        if !inner.enabled(level) {
            return Ok(());
        }
        let record = inner
            .encoder
            .encode_text(&inner.name, level, message.as_ref(), None);
        inner.dispatch(record)
    }

    /// Log a format template; arguments are rendered only if `level` passes.
    pub fn log_args(
        &self,
        level: LogLevel,
        args: fmt::Arguments<'_>,
        location: Option<SourceLocation>,
    ) -> Result<()> {
        let inner = &*self.inner;
        inner.check_open()?;
        if !inner.enabled(level) {
            return Ok(());
        }
        let record = inner
            .encoder
            .encode(&inner.name, level, args, location.as_ref());
        inner.dispatch(record)
    }

    #[inline]
    pub fn trace(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Trace, message)
    }

    #[inline]
    pub fn debug(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Debug, message)
    }

    #[inline]
    pub fn info(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Info, message)
    }

    #[inline]
    pub fn warn(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Warn, message)
    }

    #[inline]
    pub fn error(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Error, message)
    }

    #[inline]
    pub fn critical(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Critical, message)
    }

    /// Make previously logged records durable in the sink.
    ///
    /// Async: blocks until every record enqueued before this call has been
    /// written and the sink flushed. Sync: flushes whatever the sink buffers.
    pub fn flush(&self) -> Result<()> {
        let inner = &*self.inner;
        if self.is_closed() {
            return Err(LoggerError::LoggerClosed);
        }
        match &inner.mode {
            Mode::Sync(writer) => {
                let mut writer = inner.lock_sync(writer);
                if let Some(message) = &writer.failure {
                    return Err(LoggerError::writer_failed(message.clone()));
                }
                let pending = writer.sink.pending();
                match writer.sink.flush() {
                    Ok(()) => {
                        inner.settle(&writer, pending);
                        Ok(())
                    }
                    Err(e) => {
                        inner.metrics.record_lost(pending);
                        inner.fail_sync(&mut writer, &e);
                        Err(e)
                    }
                }
            }
            Mode::Async(state) => state.worker.flush(&state.queue),
        }
    }

    /// Drain, flush and release the sink. Idempotent.
    ///
    /// Producers blocked on a full queue are released with
    /// [`LoggerError::LoggerClosed`]. A fatal sink error seen earlier is
    /// returned here.
    pub fn close(&self) -> Result<()> {
        self.inner.shutdown(None)
    }

    /// Like [`Logger::close`], but gives up waiting for the worker after `timeout`.
    pub fn close_timeout(&self, timeout: Duration) -> Result<()> {
        self.inner.shutdown(Some(timeout))
    }

    /// Get the logger metrics for detailed observability
    ///
    /// # Example
    ///
    /// ```
    /// use rust_fast_logger::{Logger, NullSink};
    ///
    /// let logger = Logger::builder("metrics-doc")
    ///     .sink(Box::new(NullSink::new()))
    ///     .build()
    ///     .unwrap();
    ///
    /// logger.info("hello").unwrap();
    /// let metrics = logger.metrics();
    /// assert_eq!(metrics.total_logged(), 1);
    /// println!("Drop rate: {:.2}%", metrics.drop_rate());
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.inner.metrics
    }

    /// Records rejected by the queue policy
    pub fn dropped_count(&self) -> u64 {
        self.inner.metrics.dropped_count()
    }

    /// Records accepted but never written because the sink failed
    pub fn lost_count(&self) -> u64 {
        self.inner.metrics.lost_count()
    }

    pub fn format_failure_count(&self) -> u64 {
        self.inner.metrics.format_failures()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name())
            .field("level", &self.level())
            .field("async", &self.is_async())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl LoggerInner {
    #[inline]
    fn enabled(&self, level: LogLevel) -> bool {
        level.passes(LogLevel::from_u8(self.level.load(Ordering::Relaxed)))
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            self.metrics.record_closed_rejection();
            return Err(LoggerError::LoggerClosed);
        }
        Ok(())
    }

    fn dispatch(&self, record: LogRecord) -> Result<()> {
        if record.format_failed() {
            self.report_format_failure();
        }
        match &self.mode {
            Mode::Sync(writer) => self.write_sync(writer, record),
            Mode::Async(state) => self.enqueue(state, record),
        }
    }

    fn write_sync(&self, writer: &Mutex<SyncWriter>, record: LogRecord) -> Result<()> {
        let mut writer = self.lock_sync(writer);
        if let Some(message) = &writer.failure {
            self.metrics.record_lost(1);
            return Err(LoggerError::writer_failed(message.clone()));
        }

        let pending = writer.sink.pending();
        match writer.sink.write(&record) {
            Ok(()) => {
                self.settle(&writer, pending + 1);
                Ok(())
            }
            // Closed between the open check and taking the lock.
            Err(LoggerError::SinkClosed) => {
                self.metrics.record_closed_rejection();
                Err(LoggerError::LoggerClosed)
            }
            Err(e) => {
                self.metrics.record_lost(pending + 1);
                self.fail_sync(&mut writer, &e);
                Err(e)
            }
        }
    }

    /// Count as logged whatever of `accepted` has left the sink buffer.
    fn settle(&self, writer: &SyncWriter, accepted: u64) {
        let written = accepted.saturating_sub(writer.sink.pending());
        if written > 0 {
            self.metrics.record_written(written);
        }
    }

    fn fail_sync(&self, writer: &mut SyncWriter, error: &LoggerError) {
        if writer.failure.is_some() {
            return;
        }
        eprintln!(
            "[LOGGER ERROR] Sink '{}' of logger '{}' failed: {}. Later records are discarded.",
            writer.sink.name(),
            self.name,
            error
        );
        writer.failure = Some(error.to_string());
    }

    /// Lock the sync writer, flagging concurrent use of a single-threaded logger.
    fn lock_sync<'a>(&self, writer: &'a Mutex<SyncWriter>) -> MutexGuard<'a, SyncWriter> {
        if self.multithreaded {
            return writer.lock();
        }
        match writer.try_lock() {
            Some(guard) => guard,
            None => {
                if !self.contention_reported.swap(true, Ordering::Relaxed) {
                    eprintln!(
                        "[LOGGER WARNING] Logger '{}' is single-threaded but was called \
                         from several threads at once. Build it with multithreaded(true).",
                        self.name
                    );
                }
                writer.lock()
            }
        }
    }

    fn enqueue(&self, state: &AsyncState, record: LogRecord) -> Result<()> {
        match state.queue.push(record) {
            Ok(Pushed::Enqueued) => Ok(()),
            Ok(Pushed::Waited) => {
                self.metrics.record_block();
                Ok(())
            }
            Ok(Pushed::Evicted) => {
                self.metrics.record_queue_full();
                let overwritten = self.metrics.record_overwritten();
                self.alert_overflow(overwritten, "overwritten", state.queue.policy());
                Ok(())
            }
            Err(e @ LoggerError::QueueFull { .. }) => {
                self.metrics.record_queue_full();
                let dropped = self.metrics.record_dropped();
                self.alert_overflow(dropped, "dropped", state.queue.policy());
                Err(e)
            }
            Err(LoggerError::LoggerClosed) => match state.shared.failure_error() {
                // Closed by the worker after a fatal sink error.
                Some(failure) => {
                    self.metrics.record_lost(1);
                    Err(failure)
                }
                None => {
                    self.metrics.record_closed_rejection();
                    Err(LoggerError::LoggerClosed)
                }
            },
            Err(e) => Err(e),
        }
    }

    /// Alert on the first discarded record and periodically thereafter
    fn alert_overflow(&self, previous: u64, action: &str, policy: OverflowPolicy) {
        let count = previous + 1;
        if previous != 0 && count % OVERFLOW_ALERT_INTERVAL != 0 {
            return;
        }
        eprintln!(
            "[LOGGER WARNING] Queue of logger '{}' full, {} logs {} ({}). \
             Consider a larger queue or a different overflow policy.",
            self.name, count, action, policy
        );
        if let Some(ref callback) = self.on_overflow {
            callback(count);
        }
    }

    fn report_format_failure(&self) {
        self.metrics.record_format_failure();
        if !self.format_failure_reported.swap(true, Ordering::Relaxed) {
            eprintln!(
                "[LOGGER WARNING] Logger '{}' could not format a message; \
                 it was written as a format error marker.",
                self.name
            );
        }
    }

    fn shutdown(&self, timeout: Option<Duration>) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let result = match &self.mode {
            Mode::Sync(writer) => {
                let mut writer = writer.lock();
                if let Some(message) = writer.failure.clone() {
                    let _ = writer.sink.close();
                    Err(LoggerError::writer_failed(message))
                } else {
                    let pending = writer.sink.pending();
                    match writer.sink.close() {
                        Ok(()) => {
                            self.settle(&writer, pending);
                            Ok(())
                        }
                        Err(e) => {
                            self.metrics.record_lost(pending);
                            self.fail_sync(&mut writer, &e);
                            Err(e)
                        }
                    }
                }
            }
            Mode::Async(state) => {
                state.queue.close();
                state.worker.request_shutdown(&state.queue);
                self.await_worker(state, timeout)
            }
        };

        registry::release(&self.name, Some(self));
        result
    }

    fn await_worker(&self, state: &AsyncState, timeout: Option<Duration>) -> Result<()> {
        if let Some(timeout) = timeout {
            let start = Instant::now();
            while !state.worker.is_finished() {
                if start.elapsed() >= timeout {
                    eprintln!(
                        "[LOGGER WARNING] Async worker of logger '{}' did not finish within {:?} timeout. \
                         Some logs may be lost.",
                        self.name, timeout
                    );
                    return Err(LoggerError::other(format!(
                        "async worker did not finish within {:?}",
                        timeout
                    )));
                }
                thread::sleep(Duration::from_millis(10));
            }
        }

        state.worker.join()?;

        // Left behind only if the worker stopped without draining.
        let mut stranded = 0u64;
        while state.queue.try_pop().is_some() {
            stranded += 1;
        }
        if stranded > 0 {
            self.metrics.record_lost(stranded);
        }

        match state.shared.failure_error() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

impl Drop for LoggerInner {
    fn drop(&mut self) {
        match self.shutdown(Some(self.shutdown_timeout)) {
            // Already reported when the sink failed.
            Ok(()) | Err(LoggerError::WriterFailed { .. }) => {}
            Err(e) => eprintln!("[LOGGER ERROR] Failed to close logger '{}': {}", self.name, e),
        }

        let dropped = self.metrics.dropped_count() + self.metrics.overwritten_count();
        let lost = self.metrics.lost_count();
        if dropped > 0 || lost > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger '{}' shutting down with {} dropped and {} lost logs (drop rate: {:.2}%)",
                self.name,
                dropped,
                lost,
                self.metrics.drop_rate()
            );
        }
    }
}

enum SinkSource {
    File { path: PathBuf, truncate: bool },
    Custom(Box<dyn Sink>),
}

/// Builder for constructing a [`Logger`] with a fluent API
///
/// # Example
/// ```
/// use rust_fast_logger::prelude::*;
/// use std::sync::Arc;
///
/// let dir = tempfile::tempdir().unwrap();
/// let logger = Logger::builder("speedlogger")
///     .file(dir.path().join("speedlog.log"))
///     .truncate(true)
///     .async_queue(4096)
///     .overflow_policy(OverflowPolicy::DropNewest)
///     .on_overflow(Arc::new(|count| {
///         eprintln!("ALERT: {} logs dropped", count);
///     }))
///     .build()
///     .unwrap();
/// # logger.close().unwrap();
/// ```
pub struct LoggerBuilder {
    name: String,
    sink: Option<SinkSource>,
    truncate: bool,
    multithreaded: bool,
    min_level: LogLevel,
    timestamp_format: TimestampFormat,
    source_location: bool,
    async_config: Option<AsyncConfig>,
    overflow_policy: Option<OverflowPolicy>,
    on_overflow: Option<OverflowCallback>,
    shutdown_timeout: Duration,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sink: None,
            truncate: false,
            multithreaded: true,
            min_level: LogLevel::default(),
            timestamp_format: TimestampFormat::default(),
            source_location: false,
            async_config: None,
            overflow_policy: None,
            on_overflow: None,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Bound on waiting for the worker when the last handle is dropped
    #[must_use = "builder methods return a new value"]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Write to the file at `path`
    #[must_use = "builder methods return a new value"]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sink = Some(SinkSource::File {
            path: path.into(),
            truncate: self.truncate,
        });
        self
    }

    /// Truncate the file on open instead of appending
    #[must_use = "builder methods return a new value"]
    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        if let Some(SinkSource::File { truncate: t, .. }) = &mut self.sink {
            *t = truncate;
        }
        self
    }

    /// Write to a caller-provided sink instead of a file
    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: Box<dyn Sink>) -> Self {
        self.sink = Some(SinkSource::Custom(sink));
        self
    }

    /// `false` declares that only one thread will ever log through this logger
    #[must_use = "builder methods return a new value"]
    pub fn multithreaded(mut self, multithreaded: bool) -> Self {
        self.multithreaded = multithreaded;
        self
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Prefix messages logged through the macros with `[file:line]`
    #[must_use = "builder methods return a new value"]
    pub fn source_location(mut self, enabled: bool) -> Self {
        self.source_location = enabled;
        self
    }

    /// Enable async mode with the given queue settings
    ///
    /// If not called, the logger will use synchronous mode.
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(mut self, config: AsyncConfig) -> Self {
        self.async_config = Some(config);
        self
    }

    /// Enable async mode with a queue of `capacity` slots (a power of two)
    #[must_use = "builder methods return a new value"]
    pub fn async_queue(mut self, capacity: usize) -> Self {
        let policy = self
            .async_config
            .map(|config| config.overflow_policy)
            .unwrap_or_default();
        self.async_config = Some(AsyncConfig::new(capacity).with_overflow_policy(policy));
        self
    }

    /// Set the overflow policy for async logging
    ///
    /// Determines what happens when the queue is full. Default is `Block`.
    /// Ignored in sync mode.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_fast_logger::prelude::*;
    /// use std::time::Duration;
    ///
    /// let logger = Logger::builder("timeout-doc")
    ///     .sink(Box::new(NullSink::new()))
    ///     .async_queue(128)
    ///     .overflow_policy(OverflowPolicy::BlockWithTimeout(Duration::from_millis(50)))
    ///     .build()
    ///     .unwrap();
    /// # logger.close().unwrap();
    /// ```
    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = Some(policy);
        self
    }

    /// Set a callback for overflow notifications
    ///
    /// The callback is invoked alongside the overflow warning: on the first
    /// discarded record and every 1000th after that. The parameter is the
    /// running count.
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    /// Build the logger and register its name.
    ///
    /// # Errors
    ///
    /// - [`LoggerError::InvalidConfiguration`] for an empty name, a missing
    ///   sink, a bad queue capacity or timestamp pattern
    /// - [`LoggerError::DuplicateLogger`] if the name is taken
    /// - [`LoggerError::IoOperation`] / [`LoggerError::FileLockError`] if the
    ///   file cannot be opened
    pub fn build(mut self) -> Result<Logger> {
        validate_name(&self.name)?;
        self.timestamp_format.validate()?;
        if let (Some(config), Some(policy)) = (self.async_config.as_mut(), self.overflow_policy) {
            config.overflow_policy = policy;
        }
        if let Some(config) = &self.async_config {
            config.validate()?;
        }
        if self.sink.is_none() {
            return Err(LoggerError::config(
                "LoggerBuilder",
                "no sink configured: call file() or sink()",
            ));
        }

        let name = self.name.clone();
        registry::reserve(&name)?;
        match self.assemble() {
            Ok(inner) => {
                let inner = Arc::new(inner);
                registry::attach(&name, &inner);
                Ok(Logger { inner })
            }
            Err(e) => {
                registry::release(&name, None);
                Err(e)
            }
        }
    }

    fn assemble(self) -> Result<LoggerInner> {
        let sink: Box<dyn Sink> = match self.sink {
            // Only the worker writes in async mode, so it may buffer.
            Some(SinkSource::File { path, truncate }) if self.async_config.is_some() => {
                Box::new(FileSink::open_buffered(path, truncate)?)
            }
            Some(SinkSource::File { path, truncate }) => Box::new(FileSink::open(path, truncate)?),
            Some(SinkSource::Custom(sink)) => sink,
            None => return Err(LoggerError::config("LoggerBuilder", "no sink configured")),
        };

        let name: Arc<str> = Arc::from(self.name);
        let metrics = Arc::new(LoggerMetrics::new());

        let mode = match self.async_config {
            None => Mode::Sync(Mutex::new(SyncWriter {
                sink,
                failure: None,
            })),
            Some(config) => {
                let queue = Arc::new(BoundedQueue::new(
                    config.queue_capacity,
                    config.overflow_policy,
                )?);
                let worker =
                    AsyncWorker::spawn(&name, Arc::clone(&queue), sink, Arc::clone(&metrics))?;
                let shared = Arc::clone(worker.shared());
                Mode::Async(AsyncState {
                    queue,
                    worker,
                    shared,
                })
            }
        };

        Ok(LoggerInner {
            name,
            level: AtomicU8::new(self.min_level.as_u8()),
            encoder: Encoder::new(self.timestamp_format, self.source_location),
            multithreaded: self.multithreaded,
            mode,
            metrics,
            on_overflow: self.on_overflow,
            shutdown_timeout: self.shutdown_timeout,
            closed: AtomicBool::new(false),
            format_failure_reported: AtomicBool::new(false),
            contention_reported: AtomicBool::new(false),
        })
    }
}
