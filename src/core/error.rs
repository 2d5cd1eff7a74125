//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation} ({message}): {source}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON configuration error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Message template could not be rendered
    #[error("Format error: {0}")]
    FormatError(String),

    /// Queue full with buffer details
    #[error("Log queue full: {current}/{max} messages buffered")]
    QueueFull { current: usize, max: usize },

    /// Logger already closed
    #[error("Logger already closed")]
    LoggerClosed,

    /// Sink already closed
    #[error("Sink already closed")]
    SinkClosed,

    /// The writer path stopped after a fatal sink failure
    #[error("Log writer failed: {message}")]
    WriterFailed { message: String },

    /// A logger with the same name is already registered
    #[error("Logger '{name}' already exists")]
    DuplicateLogger { name: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// File lock error
    #[error("Failed to acquire file lock on '{path}'")]
    FileLockError { path: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a queue full error with buffer details
    pub fn queue_full(current: usize, max: usize) -> Self {
        LoggerError::QueueFull { current, max }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a writer failure error
    pub fn writer_failed(message: impl Into<String>) -> Self {
        LoggerError::WriterFailed {
            message: message.into(),
        }
    }

    /// Create a duplicate logger error
    pub fn duplicate(name: impl Into<String>) -> Self {
        LoggerError::DuplicateLogger { name: name.into() }
    }

    /// Create a file lock error
    pub fn file_lock(path: impl Into<String>) -> Self {
        LoggerError::FileLockError { path: path.into() }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether the error comes from the underlying byte stream
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            LoggerError::IoOperation { .. } | LoggerError::IoError(_)
        )
    }
}
