//! Synchronous file logging
//!
//! Run with: cargo run --example sync_file [path]

use rust_fast_logger::prelude::*;
use rust_fast_logger::{critical, info, warn};

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sync_demo.log".to_string());

    let logger = Logger::builder("sync-demo")
        .file(&path)
        .truncate(true)
        .min_level(LogLevel::Debug)
        .source_location(true)
        .build()?;

    logger.debug("demo starting")?;
    for attempt in 1..=3 {
        warn!(logger, "retry attempt {} of {}", attempt, 3);
    }
    info!(logger, "multi-line input\nstays on one line");
    critical!(logger, "unable to recover from error: {}", "disk full");

    logger.close()?;

    let metrics = logger.metrics();
    println!(
        "wrote {} records to {} ({} lost)",
        metrics.total_logged(),
        path,
        metrics.lost_count()
    );
    Ok(())
}
