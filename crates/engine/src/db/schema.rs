//! Schema bootstrap.

use crate::db::DbPool;
use crate::error::AppResult;

/// Tables the engine reads and writes.
pub const REQUIRED_TABLES: [&str; 3] = ["workflow", "activity", "activity_template"];

const DDL: &[&str] = &[
    "CREATE SCHEMA IF NOT EXISTS bizflow",
    r#"
    CREATE TABLE IF NOT EXISTS bizflow.workflow (
        id          UUID PRIMARY KEY,
        tenant_id   UUID NOT NULL,
        name        TEXT NOT NULL,
        status      TEXT NOT NULL,
        context     JSONB,
        version     BIGINT NOT NULL DEFAULT 0,
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bizflow.activity_template (
        id              UUID PRIMARY KEY,
        tenant_id       UUID NOT NULL,
        name            TEXT NOT NULL,
        code            TEXT NOT NULL,
        condition       TEXT,
        configuration   JSONB,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bizflow.activity (
        id                  UUID PRIMARY KEY,
        tenant_id           UUID NOT NULL,
        workflow_id         UUID NOT NULL REFERENCES bizflow.workflow (id),
        stage_id            UUID NOT NULL,
        template_id         UUID NOT NULL REFERENCES bizflow.activity_template (id),
        name                TEXT NOT NULL,
        stage_order_index   INTEGER NOT NULL,
        order_index         INTEGER NOT NULL,
        status              TEXT NOT NULL DEFAULT 'pending',
        input_data          JSONB,
        output_data         JSONB,
        started_at          TIMESTAMPTZ,
        completed_at        TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS activity_workflow_idx ON bizflow.activity (workflow_id)",
];

/// Create the schema and tables if they do not exist.
pub async fn init_schema(pool: &DbPool) -> AppResult<()> {
    for statement in DDL {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!(tables = ?REQUIRED_TABLES, "Database schema ready");
    Ok(())
}

/// Required tables that are missing from the `bizflow` schema.
pub async fn missing_tables(pool: &DbPool) -> AppResult<Vec<String>> {
    let existing: Vec<String> = sqlx::query_scalar(
        "SELECT table_name::TEXT FROM information_schema.tables WHERE table_schema = 'bizflow'",
    )
    .fetch_all(pool)
    .await?;

    Ok(REQUIRED_TABLES
        .iter()
        .filter(|table| !existing.iter().any(|e| e == *table))
        .map(|table| table.to_string())
        .collect())
}
