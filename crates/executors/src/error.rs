//! Executor error types.

use thiserror::Error;

use crate::context::DeadlineExceeded;

/// Errors that can occur while dispatching or running a business operation.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// No executor registered for the operation code.
    #[error("Executor not found: {0}")]
    NotFound(String),

    /// The operation ran and reported a failure.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The request envelope was rejected by the operation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The caller's deadline passed before the operation returned.
    #[error("Execution deadline exceeded")]
    Timeout,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl ExecutorError {
    /// The failure text without the variant prefix for reported failures.
    pub fn detail(&self) -> String {
        match self {
            ExecutorError::ExecutionFailed(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExecutorError {
    fn from(e: serde_json::Error) -> Self {
        ExecutorError::Json(e.to_string())
    }
}

impl From<DeadlineExceeded> for ExecutorError {
    fn from(_: DeadlineExceeded) -> Self {
        ExecutorError::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExecutorError::NotFound("entity.client.create".to_string());
        assert_eq!(err.to_string(), "Executor not found: entity.client.create");

        let err = ExecutorError::Timeout;
        assert_eq!(err.to_string(), "Execution deadline exceeded");
    }

    #[test]
    fn test_error_detail() {
        let err = ExecutorError::ExecutionFailed("duplicate client".to_string());
        assert_eq!(err.detail(), "duplicate client");
        assert_eq!(ExecutorError::Timeout.detail(), "Execution deadline exceeded");
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ExecutorError = json_err.into();
        assert!(matches!(err, ExecutorError::Json(_)));
    }

    #[test]
    fn test_error_from_deadline() {
        let err: ExecutorError = DeadlineExceeded.into();
        assert!(matches!(err, ExecutorError::Timeout));
    }
}
