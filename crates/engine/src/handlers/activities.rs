//! Activity execution API handler.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use bizflow_executors::ExecutionContext;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::ActivityOutcome;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Header carrying the tenant id.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Header carrying the caller's correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Query parameters for activity execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteActivityQuery {
    /// Deadline for the whole execution, in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Execute one activity.
///
/// `POST /api/workflows/{workflow_id}/activities/{activity_id}/execute`
///
/// Returns the outcome with `200 OK` whether the activity completed, was
/// skipped or failed. Missing records, terminal activities and deadline
/// expiry map to error statuses. With an `x-tenant-id` header, an activity
/// owned by another tenant answers `404 Not Found`.
pub async fn execute_activity(
    State(state): State<AppState>,
    Path((workflow_id, activity_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ExecuteActivityQuery>,
    headers: HeaderMap,
) -> AppResult<Json<ActivityOutcome>> {
    let ctx = request_context(&headers, &query)?;

    debug!(
        request_id = %ctx.request_id,
        workflow_id = %workflow_id,
        activity_id = %activity_id,
        "Execute activity request"
    );

    let outcome = state.engine.execute(&ctx, workflow_id, activity_id).await?;

    info!(
        request_id = %ctx.request_id,
        activity_id = %activity_id,
        status = %outcome.status,
        success = outcome.success,
        "Activity execution finished"
    );

    Ok(Json(outcome))
}

/// Build the execution context from request headers and query.
fn request_context(
    headers: &HeaderMap,
    query: &ExecuteActivityQuery,
) -> AppResult<ExecutionContext> {
    let mut ctx = match header_str(headers, REQUEST_ID_HEADER)? {
        Some(id) if !id.trim().is_empty() => ExecutionContext::new(id.trim()),
        _ => ExecutionContext::generated(),
    };

    if let Some(tenant) = header_str(headers, TENANT_HEADER)? {
        let tenant_id = Uuid::parse_str(tenant.trim())
            .map_err(|e| AppError::BadRequest(format!("Invalid {} header: {}", TENANT_HEADER, e)))?;
        ctx = ctx.with_tenant(tenant_id);
    }

    match query.timeout_ms {
        Some(0) => {
            return Err(AppError::BadRequest(
                "timeout_ms must be greater than zero".to_string(),
            ))
        }
        Some(ms) => ctx = ctx.with_timeout(Duration::from_millis(ms)),
        None => {}
    }

    Ok(ctx)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<Option<&'a str>> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| AppError::BadRequest(format!("Invalid {} header", name)))
        })
        .transpose()
}
