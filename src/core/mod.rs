//! Core types and traits for the task pool

pub mod error;
pub mod task;

pub use error::{Result, TaskPoolError};
pub use task::{BoxedTask, ClosureTask, Task};
