/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Record that cannot become a track (local without id, remote without path)
    #[error("Invalid track record: {0}")]
    InvalidRecord(String),

    /// Serialization/deserialization error
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Create an invalid record error
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }
}

impl From<StorageError> for cadenza_queue::QueueError {
    fn from(err: StorageError) -> Self {
        cadenza_queue::QueueError::persistence(err.to_string())
    }
}
