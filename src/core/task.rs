//! Task trait and related types

use std::fmt;

/// A unit of work executed by one of the pool's workers
///
/// The pool never observes a result: failures are the task's own concern.
pub trait Task: Send {
    /// Run the task to completion on the calling worker thread
    fn run(&mut self);

    /// Get the task's type name for logging
    fn task_type(&self) -> &str {
        "Task"
    }
}

impl fmt::Debug for dyn Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({})", self.task_type())
    }
}

/// A boxed task that can be sent across threads
pub type BoxedTask = Box<dyn Task>;

/// Helper to create a task from a closure
pub struct ClosureTask<F>
where
    F: FnOnce() + Send,
{
    closure: Option<F>,
    name: String,
}

impl<F> ClosureTask<F>
where
    F: FnOnce() + Send,
{
    /// Create a new closure task
    pub fn new(closure: F) -> Self {
        Self {
            closure: Some(closure),
            name: "ClosureTask".to_string(),
        }
    }

    /// Create a new closure task with a custom name
    pub fn with_name<S: Into<String>>(closure: F, name: S) -> Self {
        Self {
            closure: Some(closure),
            name: name.into(),
        }
    }
}

impl<F> Task for ClosureTask<F>
where
    F: FnOnce() + Send,
{
    fn run(&mut self) {
        match self.closure.take() {
            Some(closure) => closure(),
            None => log::warn!("{} already ran, ignoring second run", self.name),
        }
    }

    fn task_type(&self) -> &str {
        &self.name
    }
}
