//! Error types for the task pool

/// Result type for task pool operations
pub type Result<T> = std::result::Result<T, TaskPoolError>;

/// Errors that can occur in the task pool and its connection wrapper
///
/// Misuse of one-shot connection settings is deliberately absent: it is a
/// programming error and panics instead of producing a value.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TaskPoolError {
    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{worker_id}: {message}")]
    SpawnError {
        /// ID the worker would have had
        worker_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// The pool has been shut down and accepts no more tasks
    #[error("Task pool '{pool_name}' is shut down")]
    PoolClosed {
        /// Name of the task pool
        pool_name: String,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// I/O failure while setting up a connection
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// General error
    #[error("{0}")]
    Other(String),
}

impl TaskPoolError {
    /// Create a spawn error
    pub fn spawn(worker_id: usize, message: impl Into<String>) -> Self {
        TaskPoolError::SpawnError {
            worker_id,
            message: message.into(),
            source: None,
        }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        worker_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        TaskPoolError::SpawnError {
            worker_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a pool closed error
    pub fn pool_closed(pool_name: impl Into<String>) -> Self {
        TaskPoolError::PoolClosed {
            pool_name: pool_name.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        TaskPoolError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TaskPoolError::Other(msg.into())
    }
}
