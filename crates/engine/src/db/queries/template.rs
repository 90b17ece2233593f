//! Activity template database queries.

use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::model::ActivityTemplate;

/// Get an activity template by ID.
pub async fn get_template(pool: &DbPool, id: Uuid) -> AppResult<Option<ActivityTemplate>> {
    let template = sqlx::query_as::<_, ActivityTemplate>(
        r#"
        SELECT id, tenant_id, name, code, condition, configuration, created_at
        FROM bizflow.activity_template
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(template)
}
