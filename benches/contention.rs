//! Criterion benchmarks comparing the two mutation strategies, uncontended
//! and under thread contention.
//!
//! ```bash
//! cargo bench --bench contention
//! cargo bench --bench contention -- uncontended
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use contend::{run_tasks, CacheLine, Mutation, Strategy, Task};

const OPS: u64 = 10_000;

fn bench_uncontended(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncontended");
    group.throughput(Throughput::Elements(OPS));

    for strategy in [Strategy::Atomic, Strategy::Cas] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{strategy:?}")),
            &strategy,
            |b, &strategy| {
                let line = CacheLine::new();
                b.iter(|| strategy.apply_n(black_box(&line), 0, Mutation::Increment, OPS));
            },
        );
    }

    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_4_workers");
    group.throughput(Throughput::Elements(OPS * 4));
    group.sample_size(20);

    for strategy in [Strategy::Atomic, Strategy::Cas] {
        let tasks: Vec<Task> = (0..4)
            .map(|i| Task {
                strategy,
                mutation: if i % 2 == 0 {
                    Mutation::Increment
                } else {
                    Mutation::Decrement
                },
                slot: 0,
                iterations: OPS,
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{strategy:?}")),
            &tasks,
            |b, tasks| {
                b.iter(|| {
                    let line = CacheLine::new();
                    run_tasks(black_box(&line), tasks, tasks.len())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_uncontended, bench_contended);
criterion_main!(benches);
