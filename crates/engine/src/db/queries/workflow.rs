//! Workflow database queries.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::model::Workflow;

/// Get a workflow by ID.
pub async fn get_workflow(pool: &DbPool, id: Uuid) -> AppResult<Option<Workflow>> {
    let workflow = sqlx::query_as::<_, Workflow>(
        r#"
        SELECT id, tenant_id, name, status, context, version, updated_at
        FROM bizflow.workflow
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(workflow)
}

/// Update status and context if the stored version still matches.
///
/// Returns the new version and timestamp, or `None` when the version was
/// stale or the row does not exist.
pub async fn update_workflow_if_version(
    pool: &DbPool,
    workflow: &Workflow,
) -> AppResult<Option<(i64, DateTime<Utc>)>> {
    let row: Option<(i64, DateTime<Utc>)> = sqlx::query_as(
        r#"
        UPDATE bizflow.workflow
        SET status = $3,
            context = $4,
            version = version + 1,
            updated_at = now()
        WHERE id = $1 AND version = $2
        RETURNING version, updated_at
        "#,
    )
    .bind(workflow.id)
    .bind(workflow.version)
    .bind(&workflow.status)
    .bind(&workflow.context)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Check whether a workflow row exists.
pub async fn workflow_exists(pool: &DbPool, id: Uuid) -> AppResult<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bizflow.workflow WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;

    Ok(exists)
}
