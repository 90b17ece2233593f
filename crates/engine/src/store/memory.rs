//! In-memory store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ActivityStore, ActivityTemplateStore, WorkflowStore};
use crate::error::{AppError, AppResult};
use crate::model::{Activity, ActivityStatus, ActivityTemplate, Workflow};

/// Store backed by in-process maps with the same CAS semantics as `PgStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    activities: RwLock<HashMap<Uuid, Activity>>,
    workflows: RwLock<HashMap<Uuid, Workflow>>,
    templates: RwLock<HashMap<Uuid, ActivityTemplate>>,
    template_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_activity(&self, activity: Activity) {
        self.activities.write().await.insert(activity.id, activity);
    }

    pub async fn insert_workflow(&self, workflow: Workflow) {
        self.workflows.write().await.insert(workflow.id, workflow);
    }

    pub async fn insert_template(&self, template: ActivityTemplate) {
        self.templates.write().await.insert(template.id, template);
    }

    /// Snapshot of a stored activity.
    pub async fn activity(&self, id: Uuid) -> Option<Activity> {
        self.activities.read().await.get(&id).cloned()
    }

    /// Snapshot of a stored workflow.
    pub async fn workflow(&self, id: Uuid) -> Option<Workflow> {
        self.workflows.read().await.get(&id).cloned()
    }

    /// Number of template reads served so far.
    pub fn template_reads(&self) -> usize {
        self.template_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn get_activity(&self, id: Uuid) -> AppResult<Option<Activity>> {
        Ok(self.activity(id).await)
    }

    async fn claim_activity(&self, id: Uuid) -> AppResult<Activity> {
        let mut activities = self.activities.write().await;
        let stored = activities
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Activity {}", id)))?;

        if stored.status != ActivityStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Activity {} is already {}",
                id, stored.status
            )));
        }
        stored.transition(ActivityStatus::InProgress)?;
        Ok(stored.clone())
    }

    async fn update_activity(&self, activity: &Activity) -> AppResult<()> {
        let mut activities = self.activities.write().await;
        let stored = activities
            .get_mut(&activity.id)
            .ok_or_else(|| AppError::NotFound(format!("Activity {}", activity.id)))?;

        if stored.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Activity {} is already {}",
                activity.id, stored.status
            )));
        }
        *stored = activity.clone();
        Ok(())
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn get_workflow(&self, id: Uuid) -> AppResult<Option<Workflow>> {
        Ok(self.workflow(id).await)
    }

    async fn update_workflow(&self, workflow: &Workflow) -> AppResult<Workflow> {
        let mut workflows = self.workflows.write().await;
        let stored = workflows
            .get_mut(&workflow.id)
            .ok_or_else(|| AppError::NotFound(format!("Workflow {}", workflow.id)))?;

        if stored.version != workflow.version {
            return Err(AppError::Conflict(format!(
                "Workflow {} version {} is stale (current {})",
                workflow.id, workflow.version, stored.version
            )));
        }

        let mut updated = workflow.clone();
        updated.version += 1;
        updated.updated_at = Utc::now();
        *stored = updated.clone();
        Ok(updated)
    }
}

#[async_trait]
impl ActivityTemplateStore for MemoryStore {
    async fn get_template(&self, id: Uuid) -> AppResult<Option<ActivityTemplate>> {
        self.template_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.templates.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_workflow_cas_bumps_version() {
        let store = MemoryStore::new();
        let workflow = Workflow::new("onboarding");
        store.insert_workflow(workflow.clone()).await;

        let updated = store.update_workflow(&workflow).await.unwrap();
        assert_eq!(updated.version, 1);
        assert_eq!(store.workflow(workflow.id).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_workflow_cas_rejects_stale_version() {
        let store = MemoryStore::new();
        let workflow = Workflow::new("onboarding");
        store.insert_workflow(workflow.clone()).await;

        store.update_workflow(&workflow).await.unwrap();
        let err = store.update_workflow(&workflow).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_update_missing_activity() {
        let store = MemoryStore::new();
        let activity = Activity::new(Uuid::new_v4(), Uuid::new_v4(), "ghost", 0, 0);
        let err = store.update_activity(&activity).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_claim_only_once() {
        let store = MemoryStore::new();
        let activity = Activity::new(Uuid::new_v4(), Uuid::new_v4(), "Create client", 0, 0);
        store.insert_activity(activity.clone()).await;

        let claimed = store.claim_activity(activity.id).await.unwrap();
        assert_eq!(claimed.status, ActivityStatus::InProgress);
        assert!(claimed.started_at.is_some());

        let err = store.claim_activity(activity.id).await.unwrap_err();
        assert!(err.is_conflict());
        assert!(matches!(
            store.claim_activity(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_terminal_activity_is_not_overwritten() {
        let store = MemoryStore::new();
        let activity = Activity::new(Uuid::new_v4(), Uuid::new_v4(), "Create client", 0, 0);
        store.insert_activity(activity.clone()).await;

        let mut completed = store.claim_activity(activity.id).await.unwrap();
        let mut failed = completed.clone();
        completed
            .mark_completed(serde_json::json!({}), serde_json::json!({"data": []}))
            .unwrap();
        failed.mark_failed("ACTIVITY_EXECUTION_FAILED", "late").unwrap();

        store.update_activity(&completed).await.unwrap();
        let err = store.update_activity(&failed).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(
            store.activity(activity.id).await.unwrap().status,
            ActivityStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_template_reads_counted() {
        let store = MemoryStore::new();
        let template = ActivityTemplate::new("Create client", "entity.client.create");
        store.insert_template(template.clone()).await;

        assert!(store.get_template(template.id).await.unwrap().is_some());
        assert!(store.get_template(Uuid::new_v4()).await.unwrap().is_none());
        assert_eq!(store.template_reads(), 2);
    }
}
