//! # Rust Task Pool
//!
//! An elastic worker pool: every submitted task runs on a reusable worker
//! thread, the pool grows whenever no worker is idle, and idle capacity is
//! released only when the caller asks for it.
//!
//! ## Features
//!
//! - **Grow on demand**: a task never waits in a queue; with no idle worker a
//!   new one is spawned for it
//! - **Worker reuse**: workers that finish a task park in an idle registry
//!   and take the next submission
//! - **Explicit release**: [`TaskPool::release_idle`] stops every idle worker
//!   while busy workers carry on
//! - **Consistent status**: [`TaskPool::status`] reads the idle and busy
//!   counts together without locking
//! - **Connection wrapper**: [`connection::Connection`] adds buffering and
//!   timeouts to TCP and Unix streams
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_task_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = TaskPool::new()?;
//!
//! for i in 0..4 {
//!     pool.execute(move || {
//!         println!("Task {} executing", i);
//!     })?;
//! }
//!
//! let status = pool.status();
//! println!("idle={} busy={}", status.idle, status.busy);
//!
//! // Stop whatever is idle right now.
//! pool.release_idle();
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Tasks
//!
//! ```rust
//! use rust_task_pool::prelude::*;
//!
//! struct Flush {
//!     bytes: usize,
//! }
//!
//! impl Task for Flush {
//!     fn run(&mut self) {
//!         println!("flushing {} bytes", self.bytes);
//!     }
//!
//!     fn task_type(&self) -> &str {
//!         "Flush"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let pool = TaskPool::with_config(TaskPoolConfig::new().with_name("flusher"))?;
//! pool.submit(Flush { bytes: 512 })?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connection;
pub mod core;
pub mod pool;
pub mod prelude;
pub mod tracing;

pub use crate::core::{BoxedTask, ClosureTask, Result, Task, TaskPoolError};
pub use pool::{PoolStats, PoolStatus, TaskPool, TaskPoolConfig};
