//! PostgreSQL store.

use async_trait::async_trait;
use uuid::Uuid;

use super::{ActivityStore, ActivityTemplateStore, WorkflowStore};
use crate::db::{queries, DbPool};
use crate::error::{AppError, AppResult};
use crate::model::{Activity, ActivityTemplate, Workflow};

/// Store backed by the `bizflow` PostgreSQL schema.
#[derive(Clone)]
pub struct PgStore {
    db: DbPool,
}

impl PgStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Explain a guarded activity write that touched no row.
    async fn status_conflict(&self, id: Uuid) -> AppError {
        match queries::activity::get_activity(&self.db, id).await {
            Ok(Some(stored)) => {
                AppError::Conflict(format!("Activity {} is already {}", id, stored.status))
            }
            Ok(None) => AppError::NotFound(format!("Activity {}", id)),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl ActivityStore for PgStore {
    async fn get_activity(&self, id: Uuid) -> AppResult<Option<Activity>> {
        queries::activity::get_activity(&self.db, id).await
    }

    async fn claim_activity(&self, id: Uuid) -> AppResult<Activity> {
        if let Some(claimed) = queries::activity::claim_activity(&self.db, id).await? {
            return Ok(claimed);
        }
        Err(self.status_conflict(id).await)
    }

    async fn update_activity(&self, activity: &Activity) -> AppResult<()> {
        match queries::activity::update_activity(&self.db, activity).await? {
            0 => Err(self.status_conflict(activity.id).await),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl WorkflowStore for PgStore {
    async fn get_workflow(&self, id: Uuid) -> AppResult<Option<Workflow>> {
        queries::workflow::get_workflow(&self.db, id).await
    }

    async fn update_workflow(&self, workflow: &Workflow) -> AppResult<Workflow> {
        match queries::workflow::update_workflow_if_version(&self.db, workflow).await? {
            Some((version, updated_at)) => Ok(Workflow {
                version,
                updated_at,
                ..workflow.clone()
            }),
            None if queries::workflow::workflow_exists(&self.db, workflow.id).await? => {
                Err(AppError::Conflict(format!(
                    "Workflow {} version {} is stale",
                    workflow.id, workflow.version
                )))
            }
            None => Err(AppError::NotFound(format!("Workflow {}", workflow.id))),
        }
    }
}

#[async_trait]
impl ActivityTemplateStore for PgStore {
    async fn get_template(&self, id: Uuid) -> AppResult<Option<ActivityTemplate>> {
        queries::template::get_template(&self.db, id).await
    }
}
