//! Latency benchmarks for Roata.
//!
//! These benchmarks focus on query latency while the store is being written.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use roata_bench::telemetry;
use roata_core::StateStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Benchmark a single event from bytes to visible state.
fn bench_event_to_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_to_query");

    group.bench_function("single_tracker", |b| {
        b.iter_custom(|iters| {
            let store = StateStore::new();
            let event = telemetry(1, 1);

            let start = Instant::now();
            for _ in 0..iters {
                let _ = store.apply(&event);
                black_box(store.get_tracker("T1"));
            }
            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmark route queries while a writer thread keeps applying events.
fn bench_query_under_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_under_writes");

    group.bench_function("route_1000_trackers", |b| {
        b.iter_custom(|iters| {
            let store = Arc::new(StateStore::new());
            for i in 0..1_000 {
                let _ = store.apply(&telemetry(i, 10));
            }

            let running = Arc::new(AtomicBool::new(true));
            let writer = {
                let store = Arc::clone(&store);
                let running = Arc::clone(&running);
                thread::spawn(move || {
                    let mut i = 0usize;
                    while running.load(Ordering::Relaxed) {
                        let _ = store.apply(&telemetry(i % 1_000, 10));
                        i += 1;
                    }
                })
            };

            let start = Instant::now();
            for _ in 0..iters {
                black_box(store.get_route_trackers("3"));
            }
            let elapsed = start.elapsed();

            running.store(false, Ordering::Relaxed);
            let _ = writer.join();
            elapsed
        });
    });

    group.finish();
}

criterion_group!(benches, bench_event_to_query, bench_query_under_writes);
criterion_main!(benches);
