//! Task pool, idle registry and worker implementations

pub mod registry;
pub mod task_pool;
pub mod worker;

pub use registry::{IdleRegistry, PoolStatus};
pub use task_pool::{PoolStats, TaskPool, TaskPoolConfig};
pub use worker::{WorkerStatSnapshot, WorkerState};
