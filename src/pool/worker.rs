//! Worker thread implementation

use crate::core::{BoxedTask, Result, TaskPoolError};
use crate::pool::task_pool::Shared;
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{debug, span, Level};

/// Lifecycle state of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkerState {
    /// Executing a task, or about to
    Busy,
    /// Parked in the idle registry waiting for a task
    Idle,
    /// Loop exited; the worker takes no more tasks
    Stopped,
}

impl WorkerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => WorkerState::Busy,
            1 => WorkerState::Idle,
            _ => WorkerState::Stopped,
        }
    }
}

/// Statistics for a worker thread
///
/// Shared by the worker thread, its handle and the pool's table of live
/// workers.
#[derive(Debug)]
pub(crate) struct WorkerStats {
    id: usize,
    state: AtomicU8,
    tasks_completed: AtomicU64,
    tasks_panicked: AtomicU64,
    total_processing_time_us: AtomicU64,
}

/// Statistics of one live worker at one instant
///
/// Returned by [`TaskPool::worker_stats`](crate::TaskPool::worker_stats).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkerStatSnapshot {
    /// Worker ID, also the thread name suffix
    pub worker_id: usize,
    /// Lifecycle state
    pub state: WorkerState,
    /// Tasks that ran to completion
    pub tasks_completed: u64,
    /// Tasks that panicked
    pub tasks_panicked: u64,
    /// Average time per task in microseconds
    pub average_processing_time_us: f64,
}

impl WorkerStats {
    /// Statistics for a worker that starts out busy
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            state: AtomicU8::new(WorkerState::Busy as u8),
            tasks_completed: AtomicU64::new(0),
            tasks_panicked: AtomicU64::new(0),
            total_processing_time_us: AtomicU64::new(0),
        }
    }

    pub(crate) fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn increment_completed(&self) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_panicked(&self) {
        self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
    }

    fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    pub(crate) fn get_tasks_completed(&self) -> u64 {
        self.tasks_completed.load(Ordering::Relaxed)
    }

    pub(crate) fn get_tasks_panicked(&self) -> u64 {
        self.tasks_panicked.load(Ordering::Relaxed)
    }

    /// Get average processing time per task in microseconds
    pub(crate) fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.get_tasks_completed() + self.get_tasks_panicked();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Copy the counters out
    pub(crate) fn snapshot(&self) -> WorkerStatSnapshot {
        WorkerStatSnapshot {
            worker_id: self.id,
            state: self.state(),
            tasks_completed: self.get_tasks_completed(),
            tasks_panicked: self.get_tasks_panicked(),
            average_processing_time_us: self.get_average_processing_time_us(),
        }
    }
}

pub(crate) enum Message {
    Run(BoxedTask),
    Stop,
}

/// Handle to a live worker
///
/// The idle registry stores these. Whoever pops a handle from the registry
/// owns the worker's single task slot until the worker reports idle again.
#[derive(Clone)]
pub(crate) struct WorkerHandle {
    id: usize,
    sender: Sender<Message>,
    stats: Arc<WorkerStats>,
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

impl WorkerHandle {
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn state(&self) -> WorkerState {
        self.stats.state()
    }

    /// Hand a task to the worker
    ///
    /// Never blocks. The task comes back if the worker thread is gone.
    pub(crate) fn dispatch(&self, task: BoxedTask) -> std::result::Result<(), BoxedTask> {
        self.sender
            .try_send(Message::Run(task))
            .map_err(|e| match e.into_inner() {
                Message::Run(task) => task,
                Message::Stop => unreachable!("dispatch only sends Run"),
            })
    }

    /// Ask an idle worker to exit; does not wait for it
    pub(crate) fn stop(&self) {
        if self.sender.try_send(Message::Stop).is_err() {
            log::warn!("worker {} could not take a stop signal", self.id);
        }
    }
}

/// Spawns worker threads
pub(crate) struct Worker;

impl Worker {
    /// Create and start a new worker that runs `first_task` straight away
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier for this worker
    /// * `first_task` - Task the worker runs before it first reports idle
    /// * `shared` - State of the owning pool, used to report idleness
    ///
    /// The task moves into the new thread. If the thread cannot be created
    /// the task is dropped without running.
    pub(crate) fn spawn(
        id: usize,
        first_task: BoxedTask,
        shared: Arc<Shared>,
    ) -> Result<WorkerHandle> {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let handle = WorkerHandle {
            id,
            sender,
            stats: Arc::new(WorkerStats::new(id)),
        };

        let mut builder =
            thread::Builder::new().name(format!("{}-{}", shared.config.name, id));
        if let Some(stack_size) = shared.config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        // Listed before the thread starts so its own removal always wins.
        shared
            .worker_stats
            .lock()
            .insert(id, Arc::clone(&handle.stats));

        let thread_handle = handle.clone();
        let thread_shared = Arc::clone(&shared);
        if let Err(e) = builder
            .spawn(move || Self::run(thread_handle, first_task, receiver, thread_shared))
        {
            shared.worker_stats.lock().remove(&id);
            return Err(TaskPoolError::spawn_with_source(id, "Cannot create thread", e));
        }

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_worker_spawned(id);
        log::debug!("spawned worker {}", id);

        Ok(handle)
    }

    /// Main worker loop
    ///
    /// Runs one task at a time, reports idle after each, and exits on a stop
    /// signal or once the pool is shut down.
    fn run(
        handle: WorkerHandle,
        first_task: BoxedTask,
        receiver: Receiver<Message>,
        shared: Arc<Shared>,
    ) {
        let id = handle.id;

        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        let mut running = Self::run_task(&handle, first_task, &shared);
        while running {
            match receiver.recv() {
                Ok(Message::Run(task)) => running = Self::run_task(&handle, task, &shared),
                Ok(Message::Stop) | Err(_) => {
                    log::debug!("worker {} stopped", id);
                    break;
                }
            }
        }

        // Close the mailbox first so a stopped worker never accepts a task.
        drop(receiver);
        handle.stats.set_state(WorkerState::Stopped);
        shared.worker_stats.lock().remove(&id);
        shared.counters.record_worker_stopped();

        #[cfg(feature = "tracing")]
        debug!(
            tasks_completed = handle.stats.get_tasks_completed(),
            tasks_panicked = handle.stats.get_tasks_panicked(),
            "worker exited"
        );
    }

    /// Run one task and report idle; `false` means the worker must exit
    fn run_task(handle: &WorkerHandle, mut task: BoxedTask, shared: &Shared) -> bool {
        let id = handle.id;
        handle.stats.set_state(WorkerState::Busy);
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_worker_busy(id);

        Self::execute_task(id, &mut task, &handle.stats, shared);
        drop(task);

        handle.stats.set_state(WorkerState::Idle);
        if !shared.registry.release(handle.clone()) {
            log::debug!("worker {} exiting, pool shut down", id);
            return false;
        }

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_worker_idle(id);
        true
    }

    /// Execute a single task with panic protection
    fn execute_task(id: usize, task: &mut BoxedTask, stats: &WorkerStats, shared: &Shared) {
        #[cfg(feature = "tracing")]
        let task_span = span!(Level::DEBUG, "task_execution", task_type = task.task_type());
        #[cfg(feature = "tracing")]
        let _task_guard = task_span.enter();

        let start = Instant::now();
        let panic_result = catch_unwind(AssertUnwindSafe(|| task.run()));
        let elapsed = start.elapsed();

        match panic_result {
            Ok(()) => {
                stats.increment_completed();
                shared.counters.record_task_completed();
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_completion(elapsed);
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                log::error!(
                    "worker {}: task {} panicked: {}",
                    id,
                    task.task_type(),
                    panic_msg
                );
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_panic(elapsed);
                stats.increment_panicked();
                shared.counters.record_task_panicked();
            }
        }

        stats.add_processing_time(elapsed.as_micros() as u64);
    }
}
