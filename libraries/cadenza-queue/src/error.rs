//! Error types for queue management

use thiserror::Error;

/// Queue errors
#[derive(Debug, Error)]
pub enum QueueError {
    /// Argument rejected by an operation (empty shuffle input, mismatched hint)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unrecognized ingestion mode code
    #[error("Invalid ingestion mode: {0}")]
    InvalidMode(i64),

    /// Offset outside of -1..=1 (or a direction outside of -1/+1)
    #[error("Invalid delta: {0}")]
    InvalidDelta(i64),

    /// Absolute queue position outside of the queue
    #[error("Index {index} out of bounds for queue of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// State persistence collaborator failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Track producer failed to deliver a batch
    #[error("Track producer error: {0}")]
    Producer(String),
}

impl QueueError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a producer error
    pub fn producer(msg: impl Into<String>) -> Self {
        Self::Producer(msg.into())
    }
}

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, QueueError>;
