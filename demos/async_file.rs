//! Async file logging from several threads
//!
//! Run with: cargo run --example async_file [path]

use rust_fast_logger::prelude::*;
use rust_fast_logger::info;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const THREADS: usize = 4;
const PER_THREAD: usize = 50_000;

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "async_demo.log".to_string());

    let logger = Logger::builder("async-demo")
        .file(&path)
        .truncate(true)
        .async_mode(AsyncConfig::new(1 << 16).with_overflow_policy(OverflowPolicy::Block))
        .on_overflow(Arc::new(|count| eprintln!("demo: {} records dropped", count)))
        .build()?;

    let start = Instant::now();
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = logger.clone();
            thread::spawn(move || {
                for n in 0..PER_THREAD {
                    info!(logger, "thread {} record {}", t, n);
                }
            })
        })
        .collect();
    for handle in handles {
        let _ = handle.join();
    }
    let enqueued = start.elapsed();

    logger.flush()?;
    let flushed = start.elapsed();
    logger.close()?;

    let total = THREADS * PER_THREAD;
    println!(
        "{} records: enqueued in {:?} ({:.0} ns/record), on disk after {:?}",
        total,
        enqueued,
        enqueued.as_nanos() as f64 / total as f64,
        flushed
    );
    println!(
        "written={} dropped={} lost={}",
        logger.metrics().total_logged(),
        logger.dropped_count(),
        logger.lost_count()
    );
    Ok(())
}
