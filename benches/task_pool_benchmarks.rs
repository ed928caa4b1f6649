use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rust_task_pool::pool::IdleRegistry;
use rust_task_pool::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn wait_idle(pool: &TaskPool) {
    while pool.status().busy > 0 {
        thread::yield_now();
    }
}

fn benchmark_cold_submission(c: &mut Criterion) {
    c.bench_function("cold_submission_100", |b| {
        b.iter_batched(
            || TaskPool::new().expect("Failed to create pool"),
            |pool| {
                for _ in 0..100 {
                    pool.execute(|| {
                        black_box(1 + 1);
                    })
                    .expect("Failed to submit task");
                }
                wait_idle(&pool);
            },
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_warm_submission(c: &mut Criterion) {
    let pool = TaskPool::new().expect("Failed to create pool");
    // Warm up a handful of idle workers.
    for _ in 0..8 {
        pool.execute(|| thread::sleep(Duration::from_millis(1)))
            .expect("Failed to submit task");
    }
    wait_idle(&pool);

    c.bench_function("warm_submission", |b| {
        b.iter(|| {
            pool.execute(|| {
                black_box(1 + 1);
            })
            .expect("Failed to submit task");
            wait_idle(&pool);
        });
    });
}

fn benchmark_concurrent_submission(c: &mut Criterion) {
    c.bench_function("concurrent_submission_4x100", |b| {
        b.iter_batched(
            || Arc::new(TaskPool::new().expect("Failed to create pool")),
            |pool| {
                let handles: Vec<_> = (0..4)
                    .map(|_| {
                        let pool = Arc::clone(&pool);
                        thread::spawn(move || {
                            for _ in 0..100 {
                                pool.execute(|| {
                                    black_box(1 + 1);
                                })
                                .expect("Failed to submit task");
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().expect("submitter panicked");
                }
                wait_idle(&pool);
            },
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_registry(c: &mut Criterion) {
    let registry = IdleRegistry::new();
    registry.register_spawned();

    c.bench_function("registry_release_acquire", |b| {
        b.iter(|| {
            registry.release(black_box(7u64));
            black_box(registry.try_acquire_idle());
        });
    });

    c.bench_function("registry_snapshot", |b| {
        b.iter(|| black_box(registry.snapshot()));
    });
}

criterion_group!(
    benches,
    benchmark_cold_submission,
    benchmark_warm_submission,
    benchmark_concurrent_submission,
    benchmark_registry
);
criterion_main!(benches);
