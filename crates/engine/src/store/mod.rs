//! Persistence contracts consumed by the engine.
//!
//! The engine reads records by id and writes back whole records. Activity
//! writes are status-guarded: an activity is claimed once before its
//! operation runs, and a stored terminal status is never overwritten.
//! Implementations:
//! - [`MemoryStore`]: in-process maps, used by tests and embedded setups
//! - [`PgStore`]: PostgreSQL via SQLx

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::model::{Activity, ActivityTemplate, Workflow};

/// Activity persistence.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Read an activity; `Ok(None)` when it does not exist.
    async fn get_activity(&self, id: Uuid) -> AppResult<Option<Activity>>;

    /// Move a stored `pending` activity to `in_progress` and return the
    /// claimed record. Any other stored status yields `AppError::Conflict`.
    async fn claim_activity(&self, id: Uuid) -> AppResult<Activity>;

    /// Write back status and audit fields. Fails with `AppError::Conflict`
    /// when the stored activity is already terminal.
    async fn update_activity(&self, activity: &Activity) -> AppResult<()>;
}

/// Workflow persistence.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Read a workflow; `Ok(None)` when it does not exist.
    async fn get_workflow(&self, id: Uuid) -> AppResult<Option<Workflow>>;

    /// Compare-and-swap update: succeeds only while the stored version equals
    /// `workflow.version`, and returns the stored record with the bumped
    /// version. A stale version yields `AppError::Conflict`.
    async fn update_workflow(&self, workflow: &Workflow) -> AppResult<Workflow>;
}

/// Template persistence. Only read through `TemplateCache`.
#[async_trait]
pub trait ActivityTemplateStore: Send + Sync {
    async fn get_template(&self, id: Uuid) -> AppResult<Option<ActivityTemplate>>;
}
