/// CLI error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Library error: {0}")]
    Library(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error(transparent)]
    Queue(#[from] cadenza_queue::QueueError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<CliError> for cadenza_queue::QueueError {
    fn from(err: CliError) -> Self {
        match err {
            CliError::Queue(err) => err,
            other => cadenza_queue::QueueError::producer(other.to_string()),
        }
    }
}
