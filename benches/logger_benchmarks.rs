//! Criterion benchmarks for rust_fast_logger
//!
//! Per-message latency across message lengths, for sync and async loggers
//! writing to a file or to a null sink.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_fast_logger::prelude::*;
use rust_fast_logger::{BoundedQueue, Encoder};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const MESSAGE_LENGTHS: [usize; 8] = [10, 20, 40, 100, 300, 1000, 5000, 20000];

/// Queue for the async benchmarks; large enough that the producer rarely blocks
const BENCH_QUEUE_CAPACITY: usize = 1 << 16;

fn generate_message(length: usize) -> String {
    (0..length)
        .map(|i| char::from(b'a' + (i % 26) as u8))
        .collect()
}

fn build_logger(name: &str, async_mode: bool, sink: Option<Box<dyn Sink>>, dir: &TempDir) -> Logger {
    let mut builder = Logger::builder(name).min_level(LogLevel::Trace);
    builder = match sink {
        Some(sink) => builder.sink(sink),
        None => builder.file(dir.path().join(format!("{}.log", name))).truncate(true),
    };
    if async_mode {
        builder = builder.async_queue(BENCH_QUEUE_CAPACITY);
    }
    builder.build().expect("Failed to build benchmark logger")
}

// ============================================================================
// Per-message latency by length
// ============================================================================

fn bench_message_lengths(c: &mut Criterion) {
    let dir = TempDir::new().expect("Failed to create temp dir");

    for (mode, async_mode) in [("sync", false), ("async", true)] {
        for target in ["file", "null"] {
            let name = format!("bench-{}-{}", mode, target);
            let sink: Option<Box<dyn Sink>> = match target {
                "null" => Some(Box::new(NullSink::new())),
                _ => None,
            };
            let logger = build_logger(&name, async_mode, sink, &dir);

            let mut group = c.benchmark_group(format!("{}_{}", mode, target));
            group.throughput(Throughput::Elements(1));
            for length in MESSAGE_LENGTHS {
                let message = generate_message(length);
                group.bench_with_input(BenchmarkId::from_parameter(length), &message, |b, message| {
                    b.iter(|| logger.info(black_box(message.as_str())));
                });
            }
            group.finish();

            logger.close().expect("Failed to close benchmark logger");
        }
    }
}

// ============================================================================
// Encoder and filtering
// ============================================================================

fn bench_encoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoder");
    group.throughput(Throughput::Elements(1));

    let encoder = Encoder::default();
    let name: Arc<str> = Arc::from("bench");

    group.bench_function("text_100", |b| {
        let message = generate_message(100);
        b.iter(|| encoder.encode_text(&name, LogLevel::Info, black_box(&message), None));
    });

    group.bench_function("format_args", |b| {
        b.iter(|| {
            encoder.encode(
                &name,
                LogLevel::Info,
                format_args!("user {} did {}", black_box(42), black_box("login")),
                None,
            )
        });
    });

    group.bench_function("escaped_100", |b| {
        let message = "line\n".repeat(20);
        b.iter(|| encoder.encode_text(&name, LogLevel::Info, black_box(&message), None));
    });

    group.finish();
}

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::builder("bench-filtering")
        .sink(Box::new(NullSink::new()))
        .min_level(LogLevel::Warn)
        .build()
        .expect("Failed to build benchmark logger");

    group.bench_function("filtered_out", |b| {
        b.iter(|| logger.debug(black_box("Filtered message")));
    });

    group.bench_function("passed", |b| {
        b.iter(|| logger.warn(black_box("Passed message")));
    });

    group.finish();
}

// ============================================================================
// Queue
// ============================================================================

fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounded_queue");
    group.throughput(Throughput::Elements(1));

    group.bench_function("push_pop_uncontended", |b| {
        let queue = BoundedQueue::new(1024, OverflowPolicy::Block).expect("valid capacity");
        b.iter(|| {
            let _ = queue.push(black_box(1u64));
            black_box(queue.try_pop())
        });
    });

    group.bench_function("concurrent_producers_4x1000", |b| {
        b.iter(|| {
            let queue = Arc::new(BoundedQueue::new(1024, OverflowPolicy::Block).expect("valid capacity"));
            let producers: Vec<_> = (0..4)
                .map(|_| {
                    let queue = Arc::clone(&queue);
                    thread::spawn(move || {
                        for i in 0..1000u64 {
                            let _ = queue.push(i);
                        }
                    })
                })
                .collect();

            let mut received = 0;
            while received < 4000 {
                if queue.try_pop().is_some() {
                    received += 1;
                }
            }
            for producer in producers {
                let _ = producer.join();
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_message_lengths,
    bench_encoder,
    bench_level_filtering,
    bench_queue,
);

criterion_main!(benches);
