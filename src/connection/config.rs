//! Connection configuration

use std::time::Duration;

/// Buffering and timeout settings for a [`Connection`](super::Connection)
///
/// A zero means the feature is off. Settings left off here may be turned on
/// once later through the connection's `mod_*` methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Read buffer size in bytes
    pub read_buf_size: usize,
    /// Write buffer size in bytes
    pub write_buf_size: usize,
    /// Per-read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Per-write timeout in milliseconds
    pub write_timeout_ms: u64,
}

impl ConnectionConfig {
    /// Everything off
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer reads
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_read_buf_size(mut self, bytes: usize) -> Self {
        self.read_buf_size = bytes;
        self
    }

    /// Buffer writes
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_write_buf_size(mut self, bytes: usize) -> Self {
        self.write_buf_size = bytes;
        self
    }

    /// Time out each read
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_read_timeout_ms(mut self, ms: u64) -> Self {
        self.read_timeout_ms = ms;
        self
    }

    /// Time out each write
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_write_timeout_ms(mut self, ms: u64) -> Self {
        self.write_timeout_ms = ms;
        self
    }
}

/// Zero milliseconds means no timeout.
pub(crate) fn timeout_from_ms(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}
