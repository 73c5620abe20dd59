//! Error taxonomy shared by tasks, the dispatcher and remote callers.

use serde::{Deserialize, Serialize};

/// Result type for compute operations.
pub type Result<T> = std::result::Result<T, ComputeError>;

/// Errors raised by a task while validating or computing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError {
    /// Structurally invalid input, detected before any real work starts
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The computation itself failed
    #[error("execution failed: {0}")]
    Execution(String),
}

/// Errors seen by a caller of [`Computer::execute`](crate::Computer::execute).
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// The task rejected its own input
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The task failed while computing
    #[error("execution failed: {0}")]
    Execution(String),

    /// The dispatcher could not be reached or the lookup failed
    #[error("transport failure: {0}")]
    Transport(String),

    /// No handler is registered for the submitted task kind
    #[error("unsupported task kind: {0}")]
    UnsupportedTask(String),

    /// The reply carries a result of another type than the task declares
    #[error("result type mismatch: expected {expected}, found {found}")]
    ResultType {
        /// Tag the caller expected
        expected: String,
        /// Tag found on the reply
        found: String,
    },

    /// Payload could not be encoded or decoded
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Failure class carried across the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`ComputeError::InvalidArgument`]
    InvalidArgument,
    /// See [`ComputeError::Execution`]
    Execution,
    /// See [`ComputeError::Transport`]
    Transport,
    /// See [`ComputeError::UnsupportedTask`]
    UnsupportedTask,
    /// See [`ComputeError::ResultType`]
    ResultType,
    /// Payload or request line could not be decoded
    Malformed,
}

impl ComputeError {
    /// Failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ComputeError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ComputeError::Execution(_) => ErrorKind::Execution,
            ComputeError::Transport(_) => ErrorKind::Transport,
            ComputeError::UnsupportedTask(_) => ErrorKind::UnsupportedTask,
            ComputeError::ResultType { .. } => ErrorKind::ResultType,
            ComputeError::Codec(_) => ErrorKind::Malformed,
        }
    }

    /// Message without the kind prefix, as sent on the wire.
    pub fn message(&self) -> String {
        match self {
            ComputeError::InvalidArgument(msg)
            | ComputeError::Execution(msg)
            | ComputeError::Transport(msg)
            | ComputeError::UnsupportedTask(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Rebuild an error received from a remote dispatcher.
    ///
    /// A remote `Malformed` means the server could not read what we sent;
    /// there is no `serde_json::Error` to carry, so it surfaces as a
    /// transport failure. A remote `ResultType` only has its message, not
    /// the two tags, and is reported the same way.
    pub fn from_wire(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::InvalidArgument => ComputeError::InvalidArgument(message),
            ErrorKind::Execution => ComputeError::Execution(message),
            ErrorKind::Transport => ComputeError::Transport(message),
            ErrorKind::UnsupportedTask => ComputeError::UnsupportedTask(message),
            ErrorKind::ResultType => {
                ComputeError::Transport(format!("server returned a mistyped result: {message}"))
            }
            ErrorKind::Malformed => {
                ComputeError::Transport(format!("server rejected request: {message}"))
            }
        }
    }
}

impl From<TaskError> for ComputeError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::InvalidArgument(msg) => ComputeError::InvalidArgument(msg),
            TaskError::Execution(msg) => ComputeError::Execution(msg),
        }
    }
}
