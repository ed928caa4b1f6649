//! Property-based tests for rust_task_pool using proptest

use proptest::prelude::*;
use rust_task_pool::pool::IdleRegistry;
use rust_task_pool::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
enum Op {
    Spawn,
    Finish,
    Acquire,
    Drain,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Spawn),
        Just(Op::Finish),
        Just(Op::Acquire),
        Just(Op::Drain),
    ]
}

// ============================================================================
// IdleRegistry model tests
// ============================================================================

proptest! {
    /// The registry agrees with a simple (idle list, busy count) model
    #[test]
    fn test_registry_matches_model(ops in prop::collection::vec(op(), 1..200)) {
        let registry = IdleRegistry::new();
        let mut idle: Vec<u32> = Vec::new();
        let mut busy: Vec<u32> = Vec::new();
        let mut next = 0u32;

        for op in ops {
            match op {
                Op::Spawn => {
                    prop_assert!(registry.register_spawned());
                    busy.push(next);
                    next += 1;
                }
                Op::Finish => {
                    if let Some(w) = busy.pop() {
                        prop_assert!(registry.release(w));
                        idle.push(w);
                    }
                }
                Op::Acquire => {
                    let expected = if idle.is_empty() { None } else { Some(idle.remove(0)) };
                    let got = registry.try_acquire_idle();
                    prop_assert_eq!(got, expected);
                    if let Some(w) = got {
                        busy.push(w);
                    }
                }
                Op::Drain => {
                    let drained = registry.drain_all();
                    prop_assert_eq!(drained, std::mem::take(&mut idle));
                }
            }

            let status = registry.snapshot();
            prop_assert_eq!(status.idle, idle.len());
            prop_assert_eq!(status.busy, busy.len());
        }
    }
}

// ============================================================================
// TaskPool tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Every submitted task runs exactly once
    #[test]
    fn test_all_tasks_run(tasks in 1usize..64) {
        let pool = TaskPool::new().expect("Failed to create pool");
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..tasks {
            let runs = Arc::clone(&runs);
            pool.execute(move || {
                runs.fetch_add(1, Ordering::SeqCst);
            })
            .expect("Failed to submit task");
        }

        for _ in 0..400 {
            if pool.status().busy == 0 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        prop_assert_eq!(runs.load(Ordering::SeqCst), tasks);
        let status = pool.status();
        prop_assert_eq!(status.busy, 0);
        prop_assert!(status.idle >= 1 && status.idle <= tasks);
    }

    /// Releasing idle workers never touches busy ones
    #[test]
    fn test_release_keeps_busy(blocked in 1usize..8, finished in 0usize..8) {
        let pool = TaskPool::new().expect("Failed to create pool");
        let (release_tx, release_rx) = crossbeam_channel::unbounded::<()>();

        // Finished tasks first, each on a fresh worker held busy until all land.
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<()>();
        let (hold_tx, hold_rx) = crossbeam_channel::unbounded::<()>();
        for _ in 0..finished {
            let done_tx = done_tx.clone();
            let hold_rx = hold_rx.clone();
            pool.execute(move || {
                let _ = done_tx.send(());
                let _ = hold_rx.recv();
            })
            .expect("Failed to submit task");
        }
        for _ in 0..blocked {
            let release_rx = release_rx.clone();
            pool.execute(move || {
                let _ = release_rx.recv();
            })
            .expect("Failed to submit task");
        }
        for _ in 0..finished {
            done_rx.recv_timeout(Duration::from_secs(2)).expect("task started");
            hold_tx.send(()).expect("hold gate");
        }
        for _ in 0..400 {
            if pool.status().idle == finished {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        prop_assert_eq!(pool.status(), PoolStatus { idle: finished, busy: blocked });
        prop_assert_eq!(pool.release_idle(), finished);
        prop_assert_eq!(pool.status(), PoolStatus { idle: 0, busy: blocked });

        for _ in 0..blocked {
            release_tx.send(()).expect("release gate");
        }
    }
}

proptest! {
    /// Config validation accepts any non-empty name and non-zero stack
    #[test]
    fn test_config_validation(name in "[a-z]{1,12}", stack in 64usize * 1024..4 * 1024 * 1024) {
        let config = TaskPoolConfig::new().with_name(name).with_stack_size(stack);
        prop_assert!(config.validate().is_ok());
    }
}
