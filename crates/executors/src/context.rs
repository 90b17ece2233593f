//! Execution context for business operations.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

/// The caller's deadline passed before the awaited call finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline exceeded")]
pub struct DeadlineExceeded;

/// Execution context threaded through every call of one activity execution.
///
/// Contains:
/// - Request identity (tenant, request id)
/// - The activity being executed (filled in by the engine before dispatch)
/// - An optional deadline bounding every awaited call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Tenant on whose behalf the request runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<Uuid>,

    /// Correlation id for logs.
    pub request_id: String,

    /// Workflow owning the activity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<Uuid>,

    /// Activity being executed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<Uuid>,

    /// Operation code the activity dispatches to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Point in time after which awaited calls are abandoned.
    #[serde(skip)]
    pub deadline: Option<Instant>,
}

impl ExecutionContext {
    /// Create a new context with the given correlation id.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    /// Create a context with a freshly generated correlation id.
    pub fn generated() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Set the tenant.
    pub fn with_tenant(mut self, tenant_id: Uuid) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Set an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now. An earlier existing deadline wins.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    /// Derive the context handed to an executor for one activity.
    pub fn for_activity(&self, workflow_id: Uuid, activity_id: Uuid, code: &str) -> Self {
        Self {
            workflow_id: Some(workflow_id),
            activity_id: Some(activity_id),
            code: Some(code.to_string()),
            ..self.clone()
        }
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Whether the deadline has already passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Await `fut`, abandoning it once the deadline passes.
    pub async fn bound<F: Future>(&self, fut: F) -> Result<F::Output, DeadlineExceeded> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| DeadlineExceeded),
            None => Ok(fut.await),
        }
    }
}
