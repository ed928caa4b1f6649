//! Tracing integration for observability.
//!
//! With the `tracing` feature enabled, workers run inside a `worker` span,
//! each task inside a `task_execution` span, and the pool emits metric-style
//! trace events for submissions, worker lifecycle and releases.
//!
//! # Example
//!
//! ```rust,ignore
//! use rust_task_pool::prelude::*;
//! use rust_task_pool::tracing::TracedTask;
//!
//! let pool = TaskPool::new()?;
//! let span = tracing::info_span!("request", id = 7);
//! let _enter = span.enter();
//!
//! // Runs inside the `request` span on the worker thread.
//! pool.submit(TracedTask::new(ClosureTask::new(|| tracing::info!("hello"))))?;
//! ```

use crate::core::Task;

/// A task wrapper that propagates tracing context across thread boundaries.
///
/// The span current at construction is entered again when the task runs on
/// a worker. Without the `tracing` feature this is a plain passthrough.
pub struct TracedTask<T: Task> {
    inner: T,
    #[cfg(feature = "tracing")]
    span: tracing::Span,
}

impl<T: Task> TracedTask<T> {
    /// Wrap `task`, capturing the current span.
    pub fn new(task: T) -> Self {
        Self {
            inner: task,
            #[cfg(feature = "tracing")]
            span: tracing::Span::current(),
        }
    }

    /// Wrap `task` with an explicit span.
    #[cfg(feature = "tracing")]
    pub fn with_span(task: T, span: tracing::Span) -> Self {
        Self { inner: task, span }
    }
}

impl<T: Task> Task for TracedTask<T> {
    fn run(&mut self) {
        #[cfg(feature = "tracing")]
        let _guard = self.span.enter();
        self.inner.run()
    }

    fn task_type(&self) -> &str {
        self.inner.task_type()
    }
}

/// Metrics recording functions.
///
/// These emit tracing events that a subscriber can turn into counters,
/// gauges and histograms.
#[cfg(feature = "tracing")]
pub mod metrics {
    use crate::pool::PoolStatus;
    use std::time::Duration;

    /// Records a task submission and the resulting worker counts.
    #[inline]
    pub fn record_submission(status: PoolStatus) {
        tracing::trace!(
            counter.tasks_submitted = 1,
            gauge.workers_idle = status.idle as i64,
            gauge.workers_busy = status.busy as i64,
            "task submitted"
        );
    }

    /// Records a new worker thread.
    #[inline]
    pub fn record_worker_spawned(worker_id: usize) {
        tracing::debug!(counter.workers_spawned = 1, worker_id, "worker spawned");
    }

    /// Records a worker picking up a task.
    #[inline]
    pub fn record_worker_busy(worker_id: usize) {
        tracing::trace!(gauge.workers_busy = 1, worker_id, "worker busy");
    }

    /// Records a worker reporting idle.
    #[inline]
    pub fn record_worker_idle(worker_id: usize) {
        tracing::trace!(gauge.workers_busy = -1i64, worker_id, "worker idle");
    }

    /// Records task completion with timing.
    #[inline]
    pub fn record_completion(duration: Duration) {
        tracing::trace!(
            counter.tasks_completed = 1,
            histogram.task_duration_ms = duration.as_millis() as u64,
            "task completed"
        );
    }

    /// Records a task panic.
    #[inline]
    pub fn record_panic(duration: Duration) {
        tracing::trace!(
            counter.tasks_panicked = 1,
            histogram.task_duration_ms = duration.as_millis() as u64,
            "task panicked"
        );
    }

    /// Records a bulk release of idle workers.
    #[inline]
    pub fn record_idle_released(released: usize) {
        tracing::debug!(counter.workers_released = released as u64, "idle workers released");
    }

    /// Records pool shutdown.
    #[inline]
    pub fn record_pool_shutdown(tasks_completed: u64, tasks_panicked: u64) {
        tracing::info!(tasks_completed, tasks_panicked, "task pool shutdown");
    }
}
