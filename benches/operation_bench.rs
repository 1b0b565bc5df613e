//! Benchmark for operations and their work queues.
//!
//! Every iteration submits real tasks, so these numbers include scheduling
//! and wake-up latency on the shared runtime.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use typed_operation::effect::{Operation, QueueConfig, Task, WorkQueue};

// =============================================================================
// Operation Benchmarks
// =============================================================================

fn benchmark_constant(criterion: &mut Criterion) {
    criterion.bench_function("operation_constant", |bencher| {
        bencher.iter(|| black_box(Operation::constant(black_box(1)).await_result()));
    });
}

fn benchmark_map_chain(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("operation_map_chain");

    for length in [1, 10, 50] {
        group.bench_with_input(
            BenchmarkId::from_parameter(length),
            &length,
            |bencher, &length| {
                bencher.iter(|| {
                    let mut operation = Operation::constant(0_u64);
                    for _ in 0..length {
                        operation = operation.map(|n| n + 1);
                    }
                    black_box(operation.await_result())
                });
            },
        );
    }

    group.finish();
}

fn benchmark_join_all(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("operation_join_all");

    for width in [2, 16, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(width),
            &width,
            |bencher, &width| {
                bencher.iter(|| {
                    let all = Operation::join_all((0..width).map(Operation::constant));
                    black_box(all.await_result())
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// Queue Benchmarks
// =============================================================================

fn benchmark_queue_submit(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("queue_submit");

    for limit in [1, 4] {
        let config = QueueConfig::new()
            .with_max_concurrent_operations(limit)
            .unwrap_or_default();
        group.bench_with_input(BenchmarkId::new("tasks_100", limit), &config, |bencher, config| {
            bencher.iter(|| {
                let queue = WorkQueue::with_config(config.clone());
                let completions: Vec<_> = (0..100)
                    .map(|_| queue.submit(Task::new(|| {})))
                    .collect();
                for completion in &completions {
                    completion.wait();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_constant,
    benchmark_map_chain,
    benchmark_join_all,
    benchmark_queue_submit
);
criterion_main!(benches);
