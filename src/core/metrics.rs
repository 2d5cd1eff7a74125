//! Logger metrics for observability
//!
//! Counters for monitoring logger health: records written, records dropped by
//! the queue policy, records overwritten, records lost to sink failures and
//! formatting failures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use rust_fast_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_dropped();
/// metrics.record_logged();
///
/// assert_eq!(metrics.dropped_count(), 1);
/// assert_eq!(metrics.total_logged(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records rejected by the queue (drop-newest, block timeout)
    dropped_count: AtomicU64,

    /// Records evicted by the overwrite-oldest policy
    overwritten_count: AtomicU64,

    /// Records accepted by the engine but never written (sink failure)
    lost_count: AtomicU64,

    /// Records handed to the OS by the sink; buffered records are not counted
    total_logged: AtomicU64,

    /// Messages replaced by the format error marker
    format_failures: AtomicU64,

    /// Number of times a push found the queue full
    queue_full_events: AtomicU64,

    /// Number of times a producer had to wait for queue space
    block_events: AtomicU64,

    /// Calls rejected because the logger was closed
    closed_rejections: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            dropped_count: AtomicU64::new(0),
            overwritten_count: AtomicU64::new(0),
            lost_count: AtomicU64::new(0),
            total_logged: AtomicU64::new(0),
            format_failures: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
            closed_rejections: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn overwritten_count(&self) -> u64 {
        self.overwritten_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn lost_count(&self) -> u64 {
        self.lost_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn format_failures(&self) -> u64 {
        self.format_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.block_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn closed_rejections(&self) -> u64 {
        self.closed_rejections.load(Ordering::Relaxed)
    }

    /// Record a dropped log, returning the previous count
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_overwritten(&self) -> u64 {
        self.overwritten_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_lost(&self, count: u64) -> u64 {
        self.lost_count.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.record_written(1)
    }

    /// Record `count` records handed to the OS by the sink
    #[inline]
    pub fn record_written(&self, count: u64) -> u64 {
        self.total_logged.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_format_failure(&self) -> u64 {
        self.format_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.block_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_closed_rejection(&self) -> u64 {
        self.closed_rejections.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of records that never reached the sink, as a percentage
    ///
    /// Returns 0.0 if nothing has been processed.
    pub fn drop_rate(&self) -> f64 {
        let missing = (self.dropped_count() + self.overwritten_count() + self.lost_count()) as f64;
        let total = self.total_logged() as f64 + missing;
        if total == 0.0 {
            0.0
        } else {
            (missing / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.dropped_count.store(0, Ordering::Relaxed);
        self.overwritten_count.store(0, Ordering::Relaxed);
        self.lost_count.store(0, Ordering::Relaxed);
        self.total_logged.store(0, Ordering::Relaxed);
        self.format_failures.store(0, Ordering::Relaxed);
        self.queue_full_events.store(0, Ordering::Relaxed);
        self.block_events.store(0, Ordering::Relaxed);
        self.closed_rejections.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            dropped_count: AtomicU64::new(self.dropped_count()),
            overwritten_count: AtomicU64::new(self.overwritten_count()),
            lost_count: AtomicU64::new(self.lost_count()),
            total_logged: AtomicU64::new(self.total_logged()),
            format_failures: AtomicU64::new(self.format_failures()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            block_events: AtomicU64::new(self.block_events()),
            closed_rejections: AtomicU64::new(self.closed_rejections()),
        }
    }
}
