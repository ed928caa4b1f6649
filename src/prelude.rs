//! Convenient re-exports for common types and traits

pub use crate::connection::{Connection, ConnectionConfig, Line, Stream};
pub use crate::core::{BoxedTask, ClosureTask, Result, Task, TaskPoolError};
pub use crate::pool::{
    PoolStats, PoolStatus, TaskPool, TaskPoolConfig, WorkerStatSnapshot, WorkerState,
};
