//! Error types for settlement polling

use std::time::Duration;
use thiserror::Error;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement errors
#[derive(Error, Debug)]
pub enum Error {
    /// No terminal status before the deadline
    #[error(
        "Timed out after {elapsed:?} ({attempts} status checks) waiting for {operation}; \
         the operation may still complete on the ledger"
    )]
    Timeout {
        /// Operation being polled
        operation: String,
        /// Status fetches attempted
        attempts: u32,
        /// Time spent polling
        elapsed: Duration,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for [`Error::Timeout`]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}
