//! Bounded record queue with configurable back-pressure
//!
//! [`BoundedQueue`] wraps a lock-free [`ArrayQueue`] with the parts that need
//! to sleep: producers waiting for space under [`OverflowPolicy::Block`] and
//! the consumer waiting for records in [`BoundedQueue::pop_blocking`]. The
//! fast paths touch only atomics; the mutex is taken only when a peer is
//! known to be asleep.

use crate::core::error::{LoggerError, Result};
use crate::core::overflow_policy::OverflowPolicy;
use crossbeam_queue::ArrayQueue;
use crossbeam_utils::{Backoff, CachePadded};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{self, AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Default capacity for async loggers
pub const DEFAULT_QUEUE_CAPACITY: usize = 8192;

/// Capacity for bursty high-volume producers; preallocates every slot
pub const HIGH_THROUGHPUT_QUEUE_CAPACITY: usize = 1 << 24;

/// Successful outcome of [`BoundedQueue::push`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pushed {
    /// Stored in a free slot
    Enqueued,
    /// Stored after waiting for space
    Waited,
    /// Stored after evicting the oldest queued item
    Evicted,
}

pub struct BoundedQueue<T> {
    ring: ArrayQueue<T>,
    policy: OverflowPolicy,
    closed: AtomicBool,
    lock: Mutex<()>,
    not_empty: Condvar,
    not_full: Condvar,
    pop_waiters: AtomicUsize,
    push_waiters: AtomicUsize,
    /// Calls to `push` that have not returned yet
    producers: AtomicUsize,
    enqueued: CachePadded<AtomicUsize>,
    dequeued: CachePadded<AtomicUsize>,
    dropped: AtomicU64,
    overwritten: AtomicU64,
}

impl<T> BoundedQueue<T> {
    /// Create a queue; `capacity` must be a power of two and at least 2.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Result<Self> {
        validate_capacity(capacity)?;
        Ok(Self {
            ring: ArrayQueue::new(capacity),
            policy,
            closed: AtomicBool::new(false),
            lock: Mutex::new(()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            pop_waiters: AtomicUsize::new(0),
            push_waiters: AtomicUsize::new(0),
            producers: AtomicUsize::new(0),
            enqueued: CachePadded::new(AtomicUsize::new(0)),
            dequeued: CachePadded::new(AtomicUsize::new(0)),
            dropped: AtomicU64::new(0),
            overwritten: AtomicU64::new(0),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    #[inline]
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Items discarded by `DropNewest` or an expired `BlockWithTimeout`
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Items evicted by `OverwriteOldest`
    pub fn overwritten_count(&self) -> u64 {
        self.overwritten.load(Ordering::Relaxed)
    }

    /// Monotonic, wrapping count of items ever stored
    pub fn enqueued_position(&self) -> usize {
        self.enqueued.load(Ordering::Acquire)
    }

    /// Monotonic, wrapping count of items ever removed, evictions included
    pub fn dequeued_position(&self) -> usize {
        self.dequeued.load(Ordering::Acquire)
    }

    /// Push applying the back-pressure policy; `true` iff the item was stored.
    pub fn try_push(&self, item: T) -> bool {
        self.push(item).is_ok()
    }

    /// Push applying the back-pressure policy.
    ///
    /// # Errors
    ///
    /// - [`LoggerError::LoggerClosed`] if the queue is closed, including while
    ///   a `Block` producer is waiting
    /// - [`LoggerError::QueueFull`] if the item was dropped by `DropNewest` or
    ///   a `BlockWithTimeout` deadline
    pub fn push(&self, item: T) -> Result<Pushed> {
        // Paired with the SeqCst store in `close`: either this push sees the
        // queue closed, or `wait_for_producers` sees it in flight.
        self.producers.fetch_add(1, Ordering::SeqCst);
        let pushed = self.push_with_policy(item);
        self.producers.fetch_sub(1, Ordering::SeqCst);
        pushed
    }

    fn push_with_policy(&self, item: T) -> Result<Pushed> {
        if self.is_closed() {
            return Err(LoggerError::LoggerClosed);
        }

        let item = match self.put(item) {
            Ok(()) => {
                self.notify_consumer();
                return Ok(Pushed::Enqueued);
            }
            Err(item) => item,
        };

        match self.policy {
            OverflowPolicy::Block => self.push_waiting(item, None),
            OverflowPolicy::BlockWithTimeout(timeout) => {
                self.push_waiting(item, Some(Instant::now() + timeout))
            }
            OverflowPolicy::DropNewest => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(LoggerError::queue_full(self.len(), self.capacity()))
            }
            OverflowPolicy::OverwriteOldest => Ok(self.push_overwriting(item)),
        }
    }

    pub fn try_pop(&self) -> Option<T> {
        let item = self.take();
        if item.is_some() {
            self.notify_producer();
        }
        item
    }

    /// Pop, waiting up to `timeout` for an item.
    ///
    /// Returns early with `None` when the queue is closed and empty, or when
    /// woken by [`BoundedQueue::wake_consumer`].
    pub fn pop_blocking(&self, timeout: Duration) -> Option<T> {
        if let Some(item) = self.try_pop() {
            return Some(item);
        }

        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock();
        self.pop_waiters.fetch_add(1, Ordering::SeqCst);
        atomic::fence(Ordering::SeqCst);

        let item = match self.take() {
            Some(item) => Some(item),
            None if self.is_closed() => None,
            None => {
                self.not_empty.wait_until(&mut guard, deadline);
                self.take()
            }
        };

        self.pop_waiters.fetch_sub(1, Ordering::SeqCst);
        drop(guard);

        if item.is_some() {
            self.notify_producer();
        }
        item
    }

    /// Mark the queue closed and wake every sleeper.
    ///
    /// Items already queued stay poppable; new pushes fail with `LoggerClosed`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let _guard = self.lock.lock();
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Wait until every `push` racing a [`BoundedQueue::close`] has returned.
    ///
    /// After this, on a closed queue, no item can appear behind the consumer.
    pub fn wait_for_producers(&self) {
        let backoff = Backoff::new();
        while self.producers.load(Ordering::SeqCst) > 0 {
            backoff.snooze();
        }
    }

    /// Interrupt a consumer sleeping in `pop_blocking`
    pub fn wake_consumer(&self) {
        let _guard = self.lock.lock();
        self.not_empty.notify_all();
    }

    fn put(&self, item: T) -> std::result::Result<(), T> {
        self.ring.push(item)?;
        self.enqueued.fetch_add(1, Ordering::Release);
        Ok(())
    }

    fn take(&self) -> Option<T> {
        let item = self.ring.pop()?;
        self.dequeued.fetch_add(1, Ordering::Release);
        Some(item)
    }

    fn push_waiting(&self, mut item: T, deadline: Option<Instant>) -> Result<Pushed> {
        let mut guard = self.lock.lock();

        loop {
            self.push_waiters.fetch_add(1, Ordering::SeqCst);
            atomic::fence(Ordering::SeqCst);

            if self.is_closed() {
                self.push_waiters.fetch_sub(1, Ordering::SeqCst);
                return Err(LoggerError::LoggerClosed);
            }

            match self.put(item) {
                Ok(()) => {
                    self.push_waiters.fetch_sub(1, Ordering::SeqCst);
                    drop(guard);
                    self.notify_consumer();
                    return Ok(Pushed::Waited);
                }
                Err(back) => item = back,
            }

            let timed_out = match deadline {
                Some(deadline) => self.not_full.wait_until(&mut guard, deadline).timed_out(),
                None => {
                    self.not_full.wait(&mut guard);
                    false
                }
            };
            self.push_waiters.fetch_sub(1, Ordering::SeqCst);

            if timed_out {
                if self.is_closed() {
                    return Err(LoggerError::LoggerClosed);
                }
                return match self.put(item) {
                    Ok(()) => {
                        drop(guard);
                        self.notify_consumer();
                        Ok(Pushed::Waited)
                    }
                    Err(_) => {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        Err(LoggerError::queue_full(self.len(), self.capacity()))
                    }
                };
            }
        }
    }

    fn push_overwriting(&self, item: T) -> Pushed {
        let evicted = self.ring.force_push(item);
        self.enqueued.fetch_add(1, Ordering::Release);
        self.notify_consumer();

        match evicted {
            Some(_) => {
                self.dequeued.fetch_add(1, Ordering::Release);
                self.overwritten.fetch_add(1, Ordering::Relaxed);
                Pushed::Evicted
            }
            // A consumer freed a slot in the meantime.
            None => Pushed::Enqueued,
        }
    }

    fn notify_consumer(&self) {
        atomic::fence(Ordering::SeqCst);
        if self.pop_waiters.load(Ordering::Relaxed) > 0 {
            let _guard = self.lock.lock();
            self.not_empty.notify_one();
        }
    }

    fn notify_producer(&self) {
        atomic::fence(Ordering::SeqCst);
        if self.push_waiters.load(Ordering::Relaxed) > 0 {
            let _guard = self.lock.lock();
            self.not_full.notify_one();
        }
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("policy", &self.policy)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Check a queue capacity: a power of two, at least 2
pub fn validate_capacity(capacity: usize) -> Result<()> {
    if capacity < 2 || !capacity.is_power_of_two() {
        return Err(LoggerError::config(
            "BoundedQueue",
            format!("capacity must be a power of two >= 2, got {}", capacity),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_capacity_validation() {
        assert!(BoundedQueue::<u32>::new(16, OverflowPolicy::Block).is_ok());
        assert!(BoundedQueue::<u32>::new(0, OverflowPolicy::Block).is_err());
        assert!(BoundedQueue::<u32>::new(1, OverflowPolicy::Block).is_err());
        assert!(BoundedQueue::<u32>::new(12, OverflowPolicy::Block).is_err());
    }

    #[test]
    fn test_fill_to_capacity_succeeds() {
        let queue = BoundedQueue::new(8, OverflowPolicy::DropNewest).unwrap();
        for i in 0..8 {
            assert!(queue.try_push(i));
        }
        assert!(queue.is_full());
        assert_eq!(queue.dropped_count(), 0);
    }

    #[test]
    fn test_drop_newest_counts_overflow() {
        let queue = BoundedQueue::new(4, OverflowPolicy::DropNewest).unwrap();
        for i in 0..4 {
            assert!(queue.try_push(i));
        }
        assert!(!queue.try_push(4));
        assert_eq!(queue.dropped_count(), 1);

        let drained: Vec<_> = std::iter::from_fn(|| queue.try_pop()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_overwrite_oldest_evicts_front() {
        let queue = BoundedQueue::new(4, OverflowPolicy::OverwriteOldest).unwrap();
        for i in 0..6 {
            queue.push(i).unwrap();
        }
        assert_eq!(queue.overwritten_count(), 2);

        let drained: Vec<_> = std::iter::from_fn(|| queue.try_pop()).collect();
        assert_eq!(drained, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_block_waits_for_drain() {
        let queue = Arc::new(BoundedQueue::new(4, OverflowPolicy::Block).unwrap());
        for i in 0..4 {
            assert!(queue.try_push(i));
        }

        let (done_tx, done_rx) = mpsc::channel();
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let result = queue.push(4);
                done_tx.send(()).unwrap();
                result
            })
        };

        // Still blocked: nothing has been drained.
        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());

        assert_eq!(queue.try_pop(), Some(0));
        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("producer should unblock after a pop");
        assert_eq!(producer.join().unwrap().unwrap(), Pushed::Waited);

        let drained: Vec<_> = std::iter::from_fn(|| queue.try_pop()).collect();
        assert_eq!(drained, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_block_with_timeout_drops() {
        let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(20));
        let queue = BoundedQueue::new(2, policy).unwrap();
        queue.push(1).unwrap();
        queue.push(2).unwrap();

        let started = Instant::now();
        assert!(matches!(queue.push(3), Err(LoggerError::QueueFull { .. })));
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(queue.dropped_count(), 1);
    }

    #[test]
    fn test_close_fails_blocked_producer_fast() {
        let queue = Arc::new(BoundedQueue::new(2, OverflowPolicy::Block).unwrap());
        queue.push(1).unwrap();
        queue.push(2).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(3))
        };
        thread::sleep(Duration::from_millis(50));
        queue.close();

        assert!(matches!(
            producer.join().unwrap(),
            Err(LoggerError::LoggerClosed)
        ));
        // Already-queued items are still drained after close.
        assert_eq!(queue.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), Some(2));
        assert!(matches!(queue.push(4), Err(LoggerError::LoggerClosed)));
    }

    #[test]
    fn test_pop_blocking_times_out() {
        let queue = BoundedQueue::<u8>::new(4, OverflowPolicy::Block).unwrap();
        let started = Instant::now();
        assert_eq!(queue.pop_blocking(Duration::from_millis(30)), None);
        assert!(started.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn test_pop_blocking_receives_later_push() {
        let queue = Arc::new(BoundedQueue::new(4, OverflowPolicy::Block).unwrap());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop_blocking(Duration::from_secs(5)))
        };
        thread::sleep(Duration::from_millis(30));
        queue.push(7u32).unwrap();
        assert_eq!(consumer.join().unwrap(), Some(7));
    }

    #[test]
    fn test_pop_blocking_returns_on_close() {
        let queue = Arc::new(BoundedQueue::<u32>::new(4, OverflowPolicy::Block).unwrap());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let started = Instant::now();
                let item = queue.pop_blocking(Duration::from_secs(10));
                (item, started.elapsed())
            })
        };
        thread::sleep(Duration::from_millis(30));
        queue.close();

        let (item, waited) = consumer.join().unwrap();
        assert_eq!(item, None);
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn test_wait_for_producers_after_close() {
        let queue = Arc::new(BoundedQueue::new(2, OverflowPolicy::Block).unwrap());
        queue.push(1).unwrap();
        queue.push(2).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(3))
        };
        thread::sleep(Duration::from_millis(30));
        queue.close();
        queue.wait_for_producers();

        assert!(matches!(producer.join().unwrap(), Err(LoggerError::LoggerClosed)));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.enqueued_position(), 2);
    }

    #[test]
    fn test_eviction_counts_as_dequeued() {
        let queue = BoundedQueue::new(2, OverflowPolicy::OverwriteOldest).unwrap();
        assert_eq!(queue.push(1).unwrap(), Pushed::Enqueued);
        assert_eq!(queue.push(2).unwrap(), Pushed::Enqueued);
        assert_eq!(queue.push(3).unwrap(), Pushed::Evicted);

        assert_eq!(queue.enqueued_position(), 3);
        assert_eq!(queue.dequeued_position(), 1);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_positions_track_throughput() {
        let queue = BoundedQueue::new(4, OverflowPolicy::Block).unwrap();
        for i in 0..3 {
            queue.push(i).unwrap();
        }
        queue.try_pop();
        assert_eq!(queue.enqueued_position(), 3);
        assert_eq!(queue.dequeued_position(), 1);
        assert_eq!(queue.len(), 2);
    }
}
