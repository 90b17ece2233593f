//! Activity database queries.

use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::model::Activity;

/// Get an activity by ID.
pub async fn get_activity(pool: &DbPool, id: Uuid) -> AppResult<Option<Activity>> {
    let activity = sqlx::query_as::<_, Activity>(
        r#"
        SELECT id, tenant_id, workflow_id, stage_id, template_id, name,
               stage_order_index, order_index, status,
               input_data, output_data, started_at, completed_at
        FROM bizflow.activity
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(activity)
}

/// Move a pending activity to `in_progress`.
///
/// Returns the claimed row, or `None` when the activity is missing or no
/// longer pending.
pub async fn claim_activity(pool: &DbPool, id: Uuid) -> AppResult<Option<Activity>> {
    let activity = sqlx::query_as::<_, Activity>(
        r#"
        UPDATE bizflow.activity
        SET status = 'in_progress',
            started_at = COALESCE(started_at, NOW())
        WHERE id = $1 AND status = 'pending'
        RETURNING id, tenant_id, workflow_id, stage_id, template_id, name,
                  stage_order_index, order_index, status,
                  input_data, output_data, started_at, completed_at
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(activity)
}

/// Write back status, audit snapshots and timestamps. Rows already in a
/// terminal status are left alone.
///
/// Returns the number of affected rows.
pub async fn update_activity(pool: &DbPool, activity: &Activity) -> AppResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE bizflow.activity
        SET status = $2,
            input_data = $3,
            output_data = $4,
            started_at = $5,
            completed_at = $6
        WHERE id = $1
          AND status NOT IN ('completed', 'failed', 'skipped')
        "#,
    )
    .bind(activity.id)
    .bind(activity.status.as_str())
    .bind(&activity.input_data)
    .bind(&activity.output_data)
    .bind(activity.started_at)
    .bind(activity.completed_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
