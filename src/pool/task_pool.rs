//! Task pool implementation

use crate::core::{BoxedTask, ClosureTask, Result, Task, TaskPoolError};
use crate::pool::registry::{IdleRegistry, PoolStatus};
use crate::pool::worker::{Worker, WorkerHandle, WorkerStatSnapshot, WorkerStats};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Configuration for a task pool
#[derive(Debug, Clone)]
pub struct TaskPoolConfig {
    /// Pool name, also the worker thread name prefix
    pub name: String,
    /// Stack size for worker threads (None = platform default)
    pub stack_size: Option<usize>,
}

impl Default for TaskPoolConfig {
    fn default() -> Self {
        Self {
            name: "task-worker".to_string(),
            stack_size: None,
        }
    }
}

impl TaskPoolConfig {
    /// Create a configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pool name
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Set the worker thread stack size in bytes
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(TaskPoolError::invalid_config(
                "name",
                "Pool name must not be empty",
            ));
        }
        if self.stack_size == Some(0) {
            return Err(TaskPoolError::invalid_config(
                "stack_size",
                "Stack size must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Pool-wide lifetime counters
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    tasks_submitted: AtomicU64,
    tasks_completed: AtomicU64,
    tasks_panicked: AtomicU64,
    workers_spawned: AtomicU64,
    workers_released: AtomicU64,
    workers_stopped: AtomicU64,
}

impl PoolCounters {
    pub(crate) fn record_task_completed(&self) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_task_panicked(&self) {
        self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_worker_stopped(&self) {
        self.workers_stopped.fetch_add(1, Ordering::Relaxed);
    }
}

/// Lifetime statistics of a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Tasks accepted by `submit`
    pub tasks_submitted: u64,
    /// Tasks that ran to completion
    pub tasks_completed: u64,
    /// Tasks that panicked
    pub tasks_panicked: u64,
    /// Worker threads started
    pub workers_spawned: u64,
    /// Idle workers handed a stop signal
    pub workers_released: u64,
    /// Worker threads whose loop has exited
    pub workers_stopped: u64,
    /// Current worker counts
    pub status: PoolStatus,
}

impl PoolStats {
    /// Serialize the stats as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| TaskPoolError::other(e.to_string()))
    }
}

/// State shared between a pool and its workers
pub(crate) struct Shared {
    pub(crate) config: TaskPoolConfig,
    pub(crate) registry: IdleRegistry<WorkerHandle>,
    pub(crate) counters: PoolCounters,
    /// Stats of every worker whose thread has not exited, keyed by ID
    pub(crate) worker_stats: Mutex<BTreeMap<usize, Arc<WorkerStats>>>,
    next_worker_id: AtomicUsize,
}

impl Shared {
    pub(crate) fn new(config: TaskPoolConfig) -> Self {
        Self {
            config,
            registry: IdleRegistry::new(),
            counters: PoolCounters::default(),
            worker_stats: Mutex::new(BTreeMap::new()),
            next_worker_id: AtomicUsize::new(0),
        }
    }
}

/// An elastic pool that runs each task on a reusable worker thread
///
/// # Growth
///
/// A submitted task goes to the least-recently idled worker if one exists,
/// otherwise a new worker thread is spawned for it. Tasks never wait in a
/// queue and there is no upper bound on the number of workers.
///
/// # Idle workers
///
/// Workers that finish a task park in the idle registry until they are
/// reused or released with [`release_idle`](TaskPool::release_idle).
pub struct TaskPool {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPool")
            .field("config", &self.shared.config)
            .field("status", &self.status())
            .field(
                "tasks_submitted",
                &self.shared.counters.tasks_submitted.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl TaskPool {
    /// Create a task pool with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(TaskPoolConfig::default())
    }

    /// Create a task pool with custom configuration
    pub fn with_config(config: TaskPoolConfig) -> Result<Self> {
        config.validate()?;
        log::debug!("task pool '{}' created", config.name);

        Ok(Self {
            shared: Arc::new(Shared::new(config)),
        })
    }

    /// Pool name
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// Submit a task to the pool
    ///
    /// Reuses an idle worker when one exists, otherwise spawns a new one.
    /// Never blocks waiting for capacity.
    ///
    /// # Errors
    ///
    /// - `TaskPoolError::SpawnError` - The OS refused to start a worker thread;
    ///   the task is dropped without running
    /// - `TaskPoolError::PoolClosed` - The pool was shut down
    pub fn submit<T: Task + 'static>(&self, task: T) -> Result<()> {
        self.submit_boxed(Box::new(task))
    }

    /// Submit a closure as a task
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(ClosureTask::new(f))
    }

    /// Submit an already boxed task
    pub fn submit_boxed(&self, mut task: BoxedTask) -> Result<()> {
        while let Some(worker) = self.shared.registry.try_acquire_idle() {
            match worker.dispatch(task) {
                Ok(()) => {
                    self.record_submission();
                    return Ok(());
                }
                Err(returned) => {
                    // The worker's thread is gone; forget it and try again.
                    log::warn!(
                        "idle worker {} of pool '{}' no longer accepts tasks",
                        worker.id(),
                        self.name()
                    );
                    self.shared.registry.forget_busy();
                    task = returned;
                }
            }
        }

        self.spawn_worker(task)
    }

    fn spawn_worker(&self, task: BoxedTask) -> Result<()> {
        if !self.shared.registry.register_spawned() {
            return Err(TaskPoolError::pool_closed(self.name()));
        }

        let id = self.shared.next_worker_id.fetch_add(1, Ordering::Relaxed);
        match Worker::spawn(id, task, Arc::clone(&self.shared)) {
            Ok(_handle) => {
                self.shared
                    .counters
                    .workers_spawned
                    .fetch_add(1, Ordering::Relaxed);
                self.record_submission();
                Ok(())
            }
            Err(e) => {
                self.shared.registry.forget_busy();
                log::error!("pool '{}' failed to spawn worker: {}", self.name(), e);
                Err(e)
            }
        }
    }

    fn record_submission(&self) {
        self.shared
            .counters
            .tasks_submitted
            .fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_submission(self.status());
    }

    /// Stop every currently idle worker
    ///
    /// Busy workers keep running. Stop signals are sent without waiting for
    /// the threads to exit. Returns the number of workers released.
    pub fn release_idle(&self) -> usize {
        let idle = self.shared.registry.drain_all();
        let released = idle.len();
        for worker in idle {
            worker.stop();
        }

        self.shared
            .counters
            .workers_released
            .fetch_add(released as u64, Ordering::Relaxed);

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_idle_released(released);
        log::debug!("pool '{}' released {} idle workers", self.name(), released);

        released
    }

    /// Point-in-time idle and busy worker counts
    pub fn status(&self) -> PoolStatus {
        self.shared.registry.snapshot()
    }

    /// Lifetime statistics
    pub fn stats(&self) -> PoolStats {
        let counters = &self.shared.counters;
        PoolStats {
            tasks_submitted: counters.tasks_submitted.load(Ordering::Relaxed),
            tasks_completed: counters.tasks_completed.load(Ordering::Relaxed),
            tasks_panicked: counters.tasks_panicked.load(Ordering::Relaxed),
            workers_spawned: counters.workers_spawned.load(Ordering::Relaxed),
            workers_released: counters.workers_released.load(Ordering::Relaxed),
            workers_stopped: counters.workers_stopped.load(Ordering::Relaxed),
            status: self.status(),
        }
    }

    /// Per-worker statistics of every live worker, ordered by worker ID
    ///
    /// A worker leaves this list once its thread exits.
    pub fn worker_stats(&self) -> Vec<WorkerStatSnapshot> {
        self.shared
            .worker_stats
            .lock()
            .values()
            .map(|stats| stats.snapshot())
            .collect()
    }

    /// Whether [`shutdown`](TaskPool::shutdown) has been called
    pub fn is_shut_down(&self) -> bool {
        self.shared.registry.is_closed()
    }

    /// Shut the pool down
    ///
    /// Idle workers are stopped at once. Busy workers finish their current
    /// task and then exit instead of going idle. Later submissions fail with
    /// `PoolClosed`. Calling this more than once is harmless.
    pub fn shutdown(&self) {
        let Some(idle) = self.shared.registry.close() else {
            return;
        };
        let released = idle.len();
        for worker in idle {
            worker.stop();
        }
        self.shared
            .counters
            .workers_released
            .fetch_add(released as u64, Ordering::Relaxed);

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_shutdown(
            self.shared.counters.tasks_completed.load(Ordering::Relaxed),
            self.shared.counters.tasks_panicked.load(Ordering::Relaxed),
        );
        log::debug!(
            "pool '{}' shut down, {} idle workers stopped",
            self.name(),
            released
        );
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
