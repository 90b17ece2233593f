//! Activity record and status life cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Status of an activity. Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    /// Not started yet.
    Pending,
    /// Picked up by an engine.
    InProgress,
    /// Operation ran and its output was recorded.
    Completed,
    /// Operation could not be dispatched or reported a failure.
    Failed,
    /// Condition evaluated false.
    Skipped,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Completed, failed and skipped are terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }

    /// Whether moving from `self` to `next` keeps the status monotonic.
    pub fn can_transition_to(&self, next: ActivityStatus) -> bool {
        match self {
            Self::Pending => next != Self::Pending,
            Self::InProgress => next.is_terminal(),
            Self::Completed | Self::Failed | Self::Skipped => false,
        }
    }
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status text that does not name an `ActivityStatus`.
#[derive(Debug, Error)]
#[error("unknown activity status: {0}")]
pub struct UnknownStatus(pub String);

impl TryFrom<String> for ActivityStatus {
    type Error = UnknownStatus;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            _ => Err(UnknownStatus(s)),
        }
    }
}

/// One executable step of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub workflow_id: Uuid,
    pub stage_id: Uuid,
    pub template_id: Uuid,
    pub name: String,

    /// Position of the owning stage; addresses `stage[<n>]` in the context.
    pub stage_order_index: i32,

    /// Position within the stage; addresses `activity[<n>]` in the context.
    pub order_index: i32,

    #[sqlx(try_from = "String")]
    pub status: ActivityStatus,

    /// Audit snapshot of the resolved input.
    #[sqlx(default)]
    pub input_data: Option<serde_json::Value>,

    /// Audit snapshot of the raw result, skip marker or failure.
    #[sqlx(default)]
    pub output_data: Option<serde_json::Value>,

    #[sqlx(default)]
    pub started_at: Option<DateTime<Utc>>,

    #[sqlx(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Activity {
    /// Create a pending activity.
    pub fn new(
        workflow_id: Uuid,
        template_id: Uuid,
        name: impl Into<String>,
        stage_order_index: i32,
        order_index: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            workflow_id,
            stage_id: Uuid::new_v4(),
            template_id,
            name: name.into(),
            stage_order_index,
            order_index,
            status: ActivityStatus::Pending,
            input_data: None,
            output_data: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn with_tenant(mut self, tenant_id: Uuid) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn with_stage(mut self, stage_id: Uuid) -> Self {
        self.stage_id = stage_id;
        self
    }

    /// Move to `next`, stamping timestamps. Fails on a non-monotonic move.
    pub fn transition(&mut self, next: ActivityStatus) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "Activity {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }

        let now = Utc::now();
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.completed_at = Some(now);
        }
        self.status = next;
        Ok(())
    }

    /// Record a skip with the condition text as the reason.
    pub fn mark_skipped(&mut self, reason: &str) -> AppResult<()> {
        self.transition(ActivityStatus::Skipped)?;
        self.output_data = Some(serde_json::json!({
            "skipped": true,
            "reason": reason,
        }));
        Ok(())
    }

    /// Record a failure outcome.
    pub fn mark_failed(&mut self, code: &str, message: &str) -> AppResult<()> {
        self.transition(ActivityStatus::Failed)?;
        self.output_data = Some(serde_json::json!({
            "error": { "code": code, "message": message },
        }));
        Ok(())
    }

    /// Record the resolved input and raw operation result.
    pub fn mark_completed(
        &mut self,
        input: serde_json::Value,
        output: serde_json::Value,
    ) -> AppResult<()> {
        self.transition(ActivityStatus::Completed)?;
        self.input_data = Some(input);
        self.output_data = Some(output);
        Ok(())
    }
}
