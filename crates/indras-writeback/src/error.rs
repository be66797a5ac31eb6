//! Error types for indras-writeback
//!
//! The interval structure itself cannot fail: every operation is an
//! in-memory byte manipulation. Errors only surface from the buffer pool
//! configuration.

use thiserror::Error;

/// Errors that can occur while configuring the write-back buffer
#[derive(Debug, Error)]
pub enum WritebackError {
    /// Pool configuration values are inconsistent
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),

    /// Pool configuration could not be parsed
    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),
}

impl WritebackError {
    /// Create a new InvalidConfig error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Result type for write-back configuration operations
pub type WritebackResult<T> = Result<T, WritebackError>;
