//! Error types for the task tracker.

/// Top-level error type for task management.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Malformed due date or clock input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Task file open/read/write/encode/decode failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Task identifier generation failure.
    #[error("id generation error: {0}")]
    Generation(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Notification channel error.
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, TrackerError>;
