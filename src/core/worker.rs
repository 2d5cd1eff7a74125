//! Background consumer for async loggers
//!
//! ```text
//!            record available          queue empty, sink flushed
//!   Idle ─────────────────────▶ Draining ─────────────────────▶ Idle
//!                                  │
//!                                  │ Shutdown (queue already closed)
//!                                  ▼
//!                            ShuttingDown ──▶ drained, sink closed ──▶ Stopped
//! ```
//!
//! A fatal sink error short-circuits to `Stopped`: the failure is reported
//! once on stderr, the queue is closed, and every record still queued or
//! still buffered in the sink is discarded and counted as lost. A record
//! counts as logged only once the sink has handed it to the OS.

use super::error::{LoggerError, Result};
use super::log_record::LogRecord;
use super::metrics::LoggerMetrics;
use crate::queue::BoundedQueue;
use crate::sinks::Sink;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Records written between two checks of the control channel
const BATCH_SIZE: usize = 64;

/// Upper bound on how long the worker sleeps before re-checking control messages
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Idle = 0,
    Draining = 1,
    ShuttingDown = 2,
    Stopped = 3,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Idle,
            1 => WorkerState::Draining,
            2 => WorkerState::ShuttingDown,
            _ => WorkerState::Stopped,
        }
    }
}

pub(crate) enum Control {
    /// Write everything enqueued before the request, flush, then reply
    Flush { reply: Sender<Result<()>> },
    Shutdown,
}

/// State shared between the worker thread and the logger handle
pub(crate) struct WorkerShared {
    state: AtomicU8,
    failure: Mutex<Option<String>>,
}

impl WorkerShared {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(WorkerState::Idle as u8),
            failure: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// Message of the fatal sink error that stopped the worker, if any
    pub(crate) fn failure(&self) -> Option<String> {
        self.failure.lock().clone()
    }

    pub(crate) fn failure_error(&self) -> Option<LoggerError> {
        self.failure().map(LoggerError::writer_failed)
    }
}

/// Handle owned by the logger: control channel plus the join handle
pub(crate) struct AsyncWorker {
    control: Sender<Control>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    shared: Arc<WorkerShared>,
}

impl AsyncWorker {
    pub(crate) fn spawn(
        logger_name: &str,
        queue: Arc<BoundedQueue<LogRecord>>,
        sink: Box<dyn Sink>,
        metrics: Arc<LoggerMetrics>,
    ) -> Result<Self> {
        let (control, control_rx) = crossbeam_channel::unbounded();
        let shared = Arc::new(WorkerShared::new());

        let mut worker = Worker {
            queue,
            sink,
            metrics,
            control: control_rx,
            shared: Arc::clone(&shared),
        };

        let handle = thread::Builder::new()
            .name(format!("{}-log-worker", logger_name))
            .spawn(move || worker.run())
            .map_err(|e| LoggerError::io_operation("spawning log worker", logger_name, e))?;

        Ok(Self {
            control,
            handle: Mutex::new(Some(handle)),
            shared,
        })
    }

    pub(crate) fn shared(&self) -> &Arc<WorkerShared> {
        &self.shared
    }

    /// Block until every record enqueued before this call is written and flushed.
    pub(crate) fn flush(&self, queue: &BoundedQueue<LogRecord>) -> Result<()> {
        let (reply, reply_rx) = crossbeam_channel::bounded(1);
        if self.control.send(Control::Flush { reply }).is_err() {
            return Err(self.stopped_error());
        }
        queue.wake_consumer();
        reply_rx.recv().unwrap_or_else(|_| Err(self.stopped_error()))
    }

    /// Ask the worker to finish; the queue must already be closed.
    pub(crate) fn request_shutdown(&self, queue: &BoundedQueue<LogRecord>) {
        let _ = self.control.send(Control::Shutdown);
        queue.wake_consumer();
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map_or(true, thread::JoinHandle::is_finished)
    }

    /// Join the worker thread; a panic inside it is reported as an error.
    pub(crate) fn join(&self) -> Result<()> {
        let handle = self.handle.lock().take();
        match handle {
            Some(handle) => handle
                .join()
                .map_err(|_| LoggerError::other("async log worker panicked")),
            None => Ok(()),
        }
    }

    fn stopped_error(&self) -> LoggerError {
        self.shared
            .failure_error()
            .unwrap_or(LoggerError::LoggerClosed)
    }
}

struct Worker {
    queue: Arc<BoundedQueue<LogRecord>>,
    sink: Box<dyn Sink>,
    metrics: Arc<LoggerMetrics>,
    control: Receiver<Control>,
    shared: Arc<WorkerShared>,
}

impl Worker {
    fn run(&mut self) {
        let mut dirty = false;

        loop {
            match self.control.try_recv() {
                Ok(Control::Flush { reply }) => {
                    let result = self
                        .drain_queued()
                        .and_then(|()| self.flush_sink())
                        .map_err(|e| self.shared.failure_error().unwrap_or(e));
                    dirty = false;
                    let _ = reply.send(result);
                    if self.shared.state() == WorkerState::Stopped {
                        return;
                    }
                    continue;
                }
                Ok(Control::Shutdown) | Err(TryRecvError::Disconnected) => {
                    self.shut_down();
                    return;
                }
                Err(TryRecvError::Empty) => {}
            }

            match self.queue.pop_blocking(POLL_INTERVAL) {
                Some(record) => {
                    self.shared.set_state(WorkerState::Draining);
                    if self.write_batch(record).is_err() {
                        self.drain_control_after_failure();
                        return;
                    }
                    dirty = true;
                }
                None => {
                    if dirty {
                        if self.flush_sink().is_err() {
                            self.drain_control_after_failure();
                            return;
                        }
                        dirty = false;
                    }
                    self.shared.set_state(WorkerState::Idle);
                    if self.queue.is_closed() && self.control.is_empty() {
                        // Closed without a shutdown request: the logger handle is gone.
                        self.shut_down();
                        return;
                    }
                }
            }
        }
    }

    /// Write `first` plus whatever is immediately available, up to a batch.
    fn write_batch(&mut self, first: LogRecord) -> Result<()> {
        self.write_record(first)?;
        for _ in 1..BATCH_SIZE {
            match self.queue.try_pop() {
                Some(record) => self.write_record(record)?,
                None => break,
            }
        }
        Ok(())
    }

    fn write_record(&mut self, record: LogRecord) -> Result<()> {
        let pending = self.sink.pending();
        match self.sink.write(&record) {
            Ok(()) => {
                self.settle(pending + 1);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_lost(pending + 1);
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Count as logged whatever of `accepted` has left the sink buffer.
    fn settle(&self, accepted: u64) {
        let written = accepted.saturating_sub(self.sink.pending());
        if written > 0 {
            self.metrics.record_written(written);
        }
    }

    /// Write what is queued now.
    ///
    /// Stops once the queue is seen empty, or after one queue's worth of
    /// records so that busy producers cannot hold back the reply. Either way
    /// every record pushed before the call has been taken.
    fn drain_queued(&mut self) -> Result<()> {
        self.shared.set_state(WorkerState::Draining);
        let limit = self
            .queue
            .dequeued_position()
            .wrapping_add(self.queue.capacity());
        while position_before(self.queue.dequeued_position(), limit) {
            match self.queue.try_pop() {
                Some(record) => self.write_record(record)?,
                None => break,
            }
        }
        self.shared.set_state(WorkerState::Idle);
        Ok(())
    }

    fn flush_sink(&mut self) -> Result<()> {
        let pending = self.sink.pending();
        match self.sink.flush() {
            Ok(()) => {
                self.settle(pending);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_lost(pending);
                self.fail(&e);
                Err(e)
            }
        }
    }

    fn shut_down(&mut self) {
        self.shared.set_state(WorkerState::ShuttingDown);
        self.queue.close();
        self.queue.wait_for_producers();

        while let Some(record) = self.queue.try_pop() {
            if self.write_record(record).is_err() {
                return;
            }
        }

        if self.flush_sink().is_err() {
            return;
        }

        let pending = self.sink.pending();
        if let Err(e) = self.sink.close() {
            self.metrics.record_lost(pending);
            self.fail(&e);
            return;
        }
        self.shared.set_state(WorkerState::Stopped);
    }

    /// Enter the fatal-failure path: report once, stop accepting, discard the rest.
    fn fail(&mut self, error: &LoggerError) {
        {
            let mut failure = self.shared.failure.lock();
            if failure.is_some() {
                return;
            }
            *failure = Some(error.to_string());
        }

        eprintln!(
            "[LOGGER ERROR] Sink '{}' failed: {}. Remaining queued records are discarded.",
            self.sink.name(),
            error
        );

        self.queue.close();
        self.queue.wait_for_producers();
        let mut discarded = 0u64;
        while self.queue.try_pop().is_some() {
            discarded += 1;
        }
        if discarded > 0 {
            self.metrics.record_lost(discarded);
            eprintln!("[LOGGER ERROR] {} queued records lost", discarded);
        }

        let _ = self.sink.close();
        self.shared.set_state(WorkerState::Stopped);
    }

    /// Answer pending control requests once the worker has stopped.
    fn drain_control_after_failure(&mut self) {
        let error = self.shared.failure().unwrap_or_default();
        while let Ok(message) = self.control.try_recv() {
            if let Control::Flush { reply, .. } = message {
                let _ = reply.send(Err(LoggerError::writer_failed(error.clone())));
            }
        }
    }
}

/// `a < b` on monotonically increasing, wrapping positions
#[inline]
fn position_before(a: usize, b: usize) -> bool {
    (b.wrapping_sub(a) as isize) > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Encoder, LogLevel, OverflowPolicy};
    use crate::sinks::TestSink;

    fn record(text: &str) -> LogRecord {
        Encoder::default().encode_text(&Arc::from("worker-test"), LogLevel::Info, text, None)
    }

    /// Buffers every record and fails on the first flush
    struct FailingFlushSink {
        pending: u64,
    }

    impl Sink for FailingFlushSink {
        fn write(&mut self, _record: &LogRecord) -> Result<()> {
            self.pending += 1;
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            self.pending = 0;
            Err(LoggerError::other("device gone"))
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }

        fn is_closed(&self) -> bool {
            false
        }

        fn pending(&self) -> u64 {
            self.pending
        }

        fn name(&self) -> &str {
            "failing-flush"
        }
    }

    fn setup(
        sink: impl Sink + 'static,
    ) -> (Arc<BoundedQueue<LogRecord>>, AsyncWorker, Arc<LoggerMetrics>) {
        let queue = Arc::new(BoundedQueue::new(16, OverflowPolicy::Block).unwrap());
        let metrics = Arc::new(LoggerMetrics::new());
        let worker = AsyncWorker::spawn(
            "worker-test",
            Arc::clone(&queue),
            Box::new(sink),
            Arc::clone(&metrics),
        )
        .unwrap();
        (queue, worker, metrics)
    }

    #[test]
    fn test_position_before_wraps() {
        assert!(position_before(1, 2));
        assert!(!position_before(2, 2));
        assert!(position_before(usize::MAX, 0));
    }

    #[test]
    fn test_flush_writes_everything_queued() {
        let probe = TestSink::new();
        let (queue, worker, metrics) = setup(probe.clone());

        for i in 0..10 {
            queue.push(record(&format!("r{}", i))).unwrap();
        }
        worker.flush(&queue).unwrap();

        assert_eq!(probe.len(), 10);
        assert!(probe.flush_count() >= 1);
        assert_eq!(metrics.total_logged(), 10);
    }

    #[test]
    fn test_shutdown_drains_and_stops() {
        let probe = TestSink::new();
        let (queue, worker, _metrics) = setup(probe.clone());

        for i in 0..5 {
            queue.push(record(&format!("r{}", i))).unwrap();
        }
        queue.close();
        worker.request_shutdown(&queue);
        worker.join().unwrap();

        assert_eq!(worker.shared().state(), WorkerState::Stopped);
        assert_eq!(probe.len(), 5);
        assert_eq!(probe.close_count(), 1);
    }

    #[test]
    fn test_fatal_sink_error_stops_worker() {
        let probe = TestSink::new().failing_after(2);
        let (queue, worker, metrics) = setup(probe.clone());

        // The worker may close the queue mid-loop, so count what was accepted.
        let accepted = (0..6)
            .filter(|i| queue.push(record(&format!("r{}", i))).is_ok())
            .count() as u64;
        let result = worker.flush(&queue);
        assert!(matches!(result, Err(LoggerError::WriterFailed { .. })));

        worker.join().unwrap();
        assert_eq!(worker.shared().state(), WorkerState::Stopped);
        assert!(queue.is_closed());
        assert_eq!(probe.len(), 2);
        assert_eq!(metrics.total_logged(), 2);
        assert_eq!(metrics.lost_count(), accepted - 2);
        assert!(worker.shared().failure().is_some());
    }

    #[test]
    fn test_buffered_records_lost_when_flush_fails() {
        let (queue, worker, metrics) = setup(FailingFlushSink { pending: 0 });

        let accepted = (0..4)
            .filter(|i| queue.push(record(&format!("r{}", i))).is_ok())
            .count() as u64;
        let result = worker.flush(&queue);
        assert!(matches!(result, Err(LoggerError::WriterFailed { .. })));

        worker.join().unwrap();
        assert_eq!(metrics.total_logged(), 0);
        assert_eq!(metrics.lost_count(), accepted);
    }
}
