//! Idle worker registry
//!
//! Holds the free list of idle workers together with the `(idle, busy)`
//! cardinalities. Every mutation happens under a single mutex. The two counts
//! live in one packed atomic word, written only while the mutex is held, so
//! [`IdleRegistry::snapshot`] can read both without locking and without ever
//! seeing half of an update.

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time worker counts of a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    /// Workers waiting in the idle list
    pub idle: usize,
    /// Workers currently holding a task
    pub busy: usize,
}

impl PoolStatus {
    /// Total number of live workers
    pub fn total(&self) -> usize {
        self.idle + self.busy
    }
}

#[inline]
fn pack(idle: u32, busy: u32) -> u64 {
    (u64::from(idle) << 32) | u64::from(busy)
}

#[inline]
fn unpack(word: u64) -> (u32, u32) {
    ((word >> 32) as u32, word as u32)
}

struct Inner<W> {
    idle: VecDeque<W>,
    closed: bool,
}

/// Mutex-protected free list of idle workers plus idle/busy counters
pub struct IdleRegistry<W> {
    inner: Mutex<Inner<W>>,
    counts: CachePadded<AtomicU64>,
}

impl<W> Default for IdleRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> IdleRegistry<W> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                idle: VecDeque::new(),
                closed: false,
            }),
            counts: CachePadded::new(AtomicU64::new(0)),
        }
    }

    // Callers must hold `inner`.
    fn adjust(&self, idle_delta: i64, busy_delta: i64) {
        let (idle, busy) = unpack(self.counts.load(Ordering::Acquire));
        let idle = i64::from(idle) + idle_delta;
        let busy = i64::from(busy) + busy_delta;
        debug_assert!(idle >= 0 && busy >= 0, "worker counts went negative");
        self.counts
            .store(pack(idle.max(0) as u32, busy.max(0) as u32), Ordering::Release);
    }

    /// Pop the least-recently idled worker, moving it from idle to busy
    pub fn try_acquire_idle(&self) -> Option<W> {
        let mut inner = self.inner.lock();
        let worker = inner.idle.pop_front()?;
        self.adjust(-1, 1);
        Some(worker)
    }

    /// Count a freshly spawned worker as busy
    ///
    /// Returns `false` once the registry is closed.
    pub fn register_spawned(&self) -> bool {
        let inner = self.inner.lock();
        if inner.closed {
            return false;
        }
        self.adjust(0, 1);
        true
    }

    /// Put a worker that finished its task back on the idle list
    ///
    /// Returns `false` when the registry is closed: the worker is then
    /// dropped from the busy count instead and must exit.
    pub fn release(&self, worker: W) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed {
            self.adjust(0, -1);
            return false;
        }
        inner.idle.push_back(worker);
        self.adjust(1, -1);
        true
    }

    /// Empty the idle list and hand its workers to the caller
    ///
    /// The caller stops them after the lock is released.
    pub fn drain_all(&self) -> Vec<W> {
        let mut inner = self.inner.lock();
        let drained: Vec<W> = inner.idle.drain(..).collect();
        self.adjust(-(drained.len() as i64), 0);
        drained
    }

    /// Drop a busy worker whose thread is gone from the busy count
    pub fn forget_busy(&self) {
        let _inner = self.inner.lock();
        self.adjust(0, -1);
    }

    /// Refuse further spawns and releases, returning the idle workers
    ///
    /// Only the call that actually closes the registry gets `Some`; every
    /// later call returns `None`.
    pub fn close(&self) -> Option<Vec<W>> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return None;
        }
        inner.closed = true;
        let drained: Vec<W> = inner.idle.drain(..).collect();
        self.adjust(-(drained.len() as i64), 0);
        Some(drained)
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Lock-free read of the current counts
    pub fn snapshot(&self) -> PoolStatus {
        let (idle, busy) = unpack(self.counts.load(Ordering::Acquire));
        PoolStatus {
            idle: idle as usize,
            busy: busy as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_pack_roundtrip_edges() {
        assert_eq!(unpack(pack(0, 0)), (0, 0));
        assert_eq!(unpack(pack(u32::MAX, 1)), (u32::MAX, 1));
        assert_eq!(unpack(pack(7, u32::MAX)), (7, u32::MAX));
    }

    #[test]
    fn test_acquire_on_empty_leaves_counts() {
        let registry: IdleRegistry<usize> = IdleRegistry::new();
        assert!(registry.try_acquire_idle().is_none());
        assert_eq!(registry.snapshot(), PoolStatus::default());
    }

    #[test]
    fn test_release_and_acquire_move_one_unit() {
        let registry = IdleRegistry::new();
        assert!(registry.register_spawned());
        assert!(registry.register_spawned());
        assert_eq!(registry.snapshot(), PoolStatus { idle: 0, busy: 2 });

        assert!(registry.release(1usize));
        assert_eq!(registry.snapshot(), PoolStatus { idle: 1, busy: 1 });

        assert_eq!(registry.try_acquire_idle(), Some(1));
        assert_eq!(registry.snapshot(), PoolStatus { idle: 0, busy: 2 });
    }

    #[test]
    fn test_acquire_is_fifo() {
        let registry = IdleRegistry::new();
        for id in 0..3usize {
            registry.register_spawned();
            registry.release(id);
        }
        assert_eq!(registry.try_acquire_idle(), Some(0));
        assert_eq!(registry.try_acquire_idle(), Some(1));
        assert_eq!(registry.try_acquire_idle(), Some(2));
    }

    #[test]
    fn test_drain_all_keeps_busy() {
        let registry = IdleRegistry::new();
        for id in 0..5usize {
            registry.register_spawned();
            if id < 3 {
                registry.release(id);
            }
        }
        assert_eq!(registry.snapshot(), PoolStatus { idle: 3, busy: 2 });

        let drained = registry.drain_all();
        assert_eq!(drained, vec![0, 1, 2]);
        assert_eq!(registry.snapshot(), PoolStatus { idle: 0, busy: 2 });
        assert!(registry.drain_all().is_empty());
    }

    #[test]
    fn test_close_rejects_spawn_and_release() {
        let registry = IdleRegistry::new();
        registry.register_spawned();
        registry.register_spawned();
        registry.release(10usize);

        assert_eq!(registry.close(), Some(vec![10]));
        assert!(registry.is_closed());
        assert_eq!(registry.close(), None);
        assert!(!registry.register_spawned());
        assert!(!registry.release(11));
        assert_eq!(registry.snapshot(), PoolStatus { idle: 0, busy: 0 });
    }

    #[test]
    fn test_forget_busy() {
        let registry: IdleRegistry<usize> = IdleRegistry::new();
        registry.register_spawned();
        registry.forget_busy();
        assert_eq!(registry.snapshot().total(), 0);
    }

    #[test]
    fn test_concurrent_churn_keeps_totals() {
        let registry = Arc::new(IdleRegistry::new());
        let threads = 8;
        let rounds = 1_000;

        for _ in 0..threads {
            registry.register_spawned();
        }

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for round in 0..rounds {
                        registry.release(t * rounds + round);
                        let status = registry.snapshot();
                        assert_eq!(status.total(), threads);
                        // Someone else may have taken ours, so keep trying.
                        while registry.try_acquire_idle().is_none() {
                            thread::yield_now();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("churn thread panicked");
        }
        assert_eq!(
            registry.snapshot(),
            PoolStatus {
                idle: 0,
                busy: threads
            }
        );
    }

    #[test]
    fn test_concurrent_close_has_one_winner() {
        let registry = Arc::new(IdleRegistry::new());
        for id in 0..4usize {
            registry.register_spawned();
            registry.release(id);
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.close())
            })
            .collect();

        let winners: Vec<Vec<usize>> = handles
            .into_iter()
            .filter_map(|handle| handle.join().expect("close thread panicked"))
            .collect();
        assert_eq!(winners, vec![vec![0, 1, 2, 3]]);
        assert_eq!(registry.snapshot().total(), 0);
    }
}
