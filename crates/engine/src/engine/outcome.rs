//! Result of executing one activity.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::ActivityStatus;

/// Operation could not be dispatched or reported a failure.
pub const ACTIVITY_EXECUTION_FAILED: &str = "ACTIVITY_EXECUTION_FAILED";

/// The operation ran but its output could not be written to the workflow
/// context.
pub const CONTEXT_PERSIST_FAILED: &str = "CONTEXT_PERSIST_FAILED";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeError {
    pub code: String,
    pub message: String,
}

/// Reported to the orchestrator. Operation-level failures are outcomes, not
/// errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityOutcome {
    pub success: bool,
    pub status: ActivityStatus,

    /// Raw operation result on success, the skip marker on skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_payload: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
}

impl ActivityOutcome {
    pub fn completed(result: Value) -> Self {
        Self {
            success: true,
            status: ActivityStatus::Completed,
            output_payload: Some(result),
            error: None,
        }
    }

    pub fn skipped(marker: Option<Value>) -> Self {
        Self {
            success: true,
            status: ActivityStatus::Skipped,
            output_payload: marker,
            error: None,
        }
    }

    pub fn failed(code: &str, message: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            success: false,
            status: ActivityStatus::Failed,
            output_payload: payload,
            error: Some(OutcomeError {
                code: code.to_string(),
                message: message.into(),
            }),
        }
    }

    /// Error code, if the outcome is a failure.
    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }
}
