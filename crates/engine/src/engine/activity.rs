//! Activity execution.
//!
//! One call of [`ActivityEngine::execute`] drives a single activity from
//! pending to a terminal status:
//!
//! 1. load the activity, its template (cached) and its workflow, then claim
//!    the activity (`pending` to `in_progress`)
//! 2. evaluate the template condition; a falsy condition skips the activity
//! 3. project the workflow context into the operation input
//! 4. dispatch to the executor registered for the template code
//! 5. project the result into the workflow context and persist it
//! 6. record the audit snapshot on the activity
//!
//! Operation-level failures become a failed [`ActivityOutcome`]. Only store
//! failures, missing records and deadline expiry surface as [`AppError`].

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bizflow_executors::{ExecutionContext, ExecutorError, ExecutorRegistry, RequestEnvelope};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::condition::{ConditionEvaluator, ConditionOutcome};
use super::context::set_activity_output;
use super::outcome::{ActivityOutcome, ACTIVITY_EXECUTION_FAILED, CONTEXT_PERSIST_FAILED};
use super::resolver::{ContextPathResolver, PathMapping};
use super::template_cache::TemplateCache;
use crate::config::EngineConfig;
use crate::error::{AppError, AppResult};
use crate::model::{Activity, Workflow};
use crate::result_ext::ResultExt;
use crate::store::{ActivityStore, ActivityTemplateStore, WorkflowStore};

/// Executes workflow activities.
pub struct ActivityEngine {
    activities: Arc<dyn ActivityStore>,
    workflows: Arc<dyn WorkflowStore>,
    templates: TemplateCache,
    registry: Arc<ExecutorRegistry>,
    evaluator: Option<ConditionEvaluator>,
    resolver: ContextPathResolver,
    config: EngineConfig,
    evaluator_warned: AtomicBool,
}

impl ActivityEngine {
    pub fn new(
        activities: Arc<dyn ActivityStore>,
        workflows: Arc<dyn WorkflowStore>,
        templates: Arc<dyn ActivityTemplateStore>,
        registry: Arc<ExecutorRegistry>,
        config: EngineConfig,
    ) -> Self {
        let evaluator = match ConditionEvaluator::from_config(&config) {
            Ok(evaluator) => Some(evaluator),
            Err(e) => {
                tracing::warn!(error = %e, "Condition evaluator unavailable, conditions will not skip activities");
                None
            }
        };

        Self {
            activities,
            workflows,
            templates: TemplateCache::new(templates),
            registry,
            evaluator,
            resolver: ContextPathResolver::new(),
            config,
            evaluator_warned: AtomicBool::new(false),
        }
    }

    /// Build an engine over a single store implementing every contract.
    pub fn with_store<S>(store: Arc<S>, registry: Arc<ExecutorRegistry>, config: EngineConfig) -> Self
    where
        S: ActivityStore + WorkflowStore + ActivityTemplateStore + 'static,
    {
        Self::new(store.clone(), store.clone(), store, registry, config)
    }

    /// Replace the condition evaluator. `None` runs every activity.
    pub fn with_condition_evaluator(mut self, evaluator: Option<ConditionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn registry(&self) -> &ExecutorRegistry {
        &self.registry
    }

    pub fn template_cache(&self) -> &TemplateCache {
        &self.templates
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute one activity of a workflow.
    ///
    /// Every store call and the operation itself are bounded by the
    /// context's deadline.
    #[tracing::instrument(
        skip(self, ctx),
        fields(request_id = %ctx.request_id)
    )]
    pub async fn execute(
        &self,
        ctx: &ExecutionContext,
        workflow_id: Uuid,
        activity_id: Uuid,
    ) -> AppResult<ActivityOutcome> {
        let start = Instant::now();

        if workflow_id.is_nil() {
            return Err(AppError::Validation("workflow_id must not be nil".to_string()));
        }
        if activity_id.is_nil() {
            return Err(AppError::Validation("activity_id must not be nil".to_string()));
        }

        let activity = bounded(ctx, self.activities.get_activity(activity_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity {}", activity_id)))?;

        // A tenant-scoped caller cannot see other tenants' activities.
        if let Some(tenant_id) = ctx.tenant_id {
            if activity.tenant_id != tenant_id {
                return Err(AppError::NotFound(format!("Activity {}", activity_id)));
            }
        }
        if activity.workflow_id != workflow_id {
            return Err(AppError::Validation(format!(
                "Activity {} belongs to workflow {}, not {}",
                activity_id, activity.workflow_id, workflow_id
            )));
        }
        if activity.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Activity {} is already {}",
                activity_id, activity.status
            )));
        }

        let template = bounded(ctx, self.templates.get_template(activity.template_id)).await?;
        let workflow = bounded(ctx, self.workflows.get_workflow(workflow_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workflow {}", workflow_id)))?;
        let context = workflow.context_document()?;

        // Overlapping runs of one activity race here; only one wins the claim.
        let mut activity = bounded(ctx, self.activities.claim_activity(activity_id)).await?;

        if let Some(expression) = template.condition_expression() {
            if !self.check_condition(&activity, expression, &context).should_run() {
                let outcome = self.skip_activity(ctx, activity, expression).await?;
                log_duration(workflow_id, activity_id, "skipped", start);
                return Ok(outcome);
            }
        }

        let input_mapping = match PathMapping::from_config(template.input_mapping()) {
            Ok(mapping) => mapping,
            Err(e) => {
                return self
                    .fail_activity(ctx, activity, format!("Invalid input mapping: {}", e))
                    .await
            }
        };
        let output_mapping = match PathMapping::from_config(template.output_mapping()) {
            Ok(mapping) => mapping,
            Err(e) => {
                return self
                    .fail_activity(ctx, activity, format!("Invalid output mapping: {}", e))
                    .await
            }
        };

        let input = self
            .resolver
            .resolve(&Value::Object(context), &input_mapping);
        activity.input_data = Some(input.clone());

        let Some(code) = template.operation_code() else {
            return self
                .fail_activity(ctx, activity, "No use case code defined".to_string())
                .await;
        };
        let executor = match self.registry.get(code) {
            Ok(executor) => executor,
            Err(e) => return self.fail_activity(ctx, activity, e.to_string()).await,
        };

        let mut exec_ctx = ctx.for_activity(workflow_id, activity_id, code);
        if let Some(timeout) = self.config.executor_timeout() {
            exec_ctx = exec_ctx.with_timeout(timeout);
        }

        tracing::debug!(
            activity_id = %activity_id,
            code = %code,
            input_fields = input_mapping.len(),
            "Dispatching activity"
        );

        let op_start = Instant::now();
        let invocation = exec_ctx
            .bound(executor.execute(&exec_ctx, RequestEnvelope::new(input.clone())))
            .await
            .map_err(ExecutorError::from)
            .and_then(|result| result);
        tracing::info!(
            target: "bizflow.performance",
            activity_id = %activity_id,
            code = %code,
            phase = "operation",
            duration_ms = %op_start.elapsed().as_millis(),
            "Operation returned"
        );

        let result = match invocation {
            Ok(result) => result,
            Err(e) => {
                return self
                    .fail_activity(ctx, activity, format!("Execution failed: {}", e.detail()))
                    .await
            }
        };

        let updates = self
            .resolver
            .resolve(unwrap_operation_result(&result), &output_mapping);

        if let Err(e) = self.record_output(ctx, workflow, &activity, updates).await {
            tracing::error!(
                workflow_id = %workflow_id,
                activity_id = %activity_id,
                error = %e,
                "Workflow context could not be persisted"
            );
            return self
                .fail_with(
                    ctx,
                    activity,
                    CONTEXT_PERSIST_FAILED,
                    format!("Failed to persist workflow context: {}", e),
                    Some(result),
                )
                .await;
        }

        activity.mark_completed(input, result.clone())?;
        let _ = bounded(ctx, self.activities.update_activity(&activity))
            .await
            .log(format!("recording completed activity {}", activity_id));

        log_duration(workflow_id, activity_id, "completed", start);
        Ok(ActivityOutcome::completed(result))
    }

    fn check_condition(
        &self,
        activity: &Activity,
        expression: &str,
        context: &Map<String, Value>,
    ) -> ConditionOutcome {
        let outcome = match &self.evaluator {
            Some(evaluator) => evaluator.evaluate(expression, context),
            None => {
                if !self.evaluator_warned.swap(true, Ordering::Relaxed) {
                    tracing::warn!("No condition evaluator configured, conditional activities always run");
                }
                ConditionOutcome::EvalFailed("condition evaluator unavailable".to_string())
            }
        };

        match &outcome {
            ConditionOutcome::Proceed => {
                tracing::debug!(activity_id = %activity.id, condition = %expression, "Condition met");
            }
            ConditionOutcome::Skip => {
                tracing::info!(activity_id = %activity.id, condition = %expression, "Condition not met, skipping activity");
            }
            ConditionOutcome::EvalFailed(reason) => {
                tracing::warn!(
                    activity_id = %activity.id,
                    condition = %expression,
                    reason = %reason,
                    "Condition could not be evaluated, running activity"
                );
            }
        }
        outcome
    }

    async fn skip_activity(
        &self,
        ctx: &ExecutionContext,
        mut activity: Activity,
        expression: &str,
    ) -> AppResult<ActivityOutcome> {
        activity.mark_skipped(expression)?;
        bounded(ctx, self.activities.update_activity(&activity)).await?;
        Ok(ActivityOutcome::skipped(activity.output_data))
    }

    async fn fail_activity(
        &self,
        ctx: &ExecutionContext,
        activity: Activity,
        message: String,
    ) -> AppResult<ActivityOutcome> {
        self.fail_with(ctx, activity, ACTIVITY_EXECUTION_FAILED, message, None)
            .await
    }

    /// Mark the activity failed and report it. The status write is
    /// best-effort: the outcome is returned even when it cannot be stored.
    async fn fail_with(
        &self,
        ctx: &ExecutionContext,
        mut activity: Activity,
        code: &str,
        message: String,
        payload: Option<Value>,
    ) -> AppResult<ActivityOutcome> {
        tracing::warn!(
            activity_id = %activity.id,
            code = %code,
            message = %message,
            "Activity failed"
        );

        activity.mark_failed(code, &message)?;
        let _ = bounded(ctx, self.activities.update_activity(&activity))
            .await
            .log(format!("recording failed activity {}", activity.id));

        Ok(ActivityOutcome::failed(code, message, payload))
    }

    /// Write the activity's mapped output into the workflow context.
    ///
    /// A version conflict means another activity of the same workflow wrote
    /// first: re-read the workflow and re-apply on top of its context.
    async fn record_output(
        &self,
        ctx: &ExecutionContext,
        mut workflow: Workflow,
        activity: &Activity,
        output: Value,
    ) -> AppResult<Workflow> {
        let mut conflicts = 0;
        loop {
            let mut document = workflow.context_document()?;
            set_activity_output(
                &mut document,
                activity.stage_order_index,
                activity.order_index,
                &activity.name,
                output.clone(),
            )?;
            workflow.context = Some(Value::Object(document));

            match bounded(ctx, self.workflows.update_workflow(&workflow)).await {
                Ok(updated) => return Ok(updated),
                Err(e) if e.is_conflict() && conflicts < self.config.context_update_retries => {
                    conflicts += 1;
                    tracing::debug!(
                        workflow_id = %workflow.id,
                        attempt = conflicts,
                        "Workflow version conflict, re-reading context"
                    );
                    workflow = bounded(ctx, self.workflows.get_workflow(workflow.id))
                        .await?
                        .ok_or_else(|| AppError::NotFound(format!("Workflow {}", workflow.id)))?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Await a store call under the context's deadline.
async fn bounded<T, F>(ctx: &ExecutionContext, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    ctx.bound(fut).await?
}

/// Results shaped `{"data": [{...}, ...]}` expose their first row to the
/// output mapping; anything else is mapped as-is.
fn unwrap_operation_result(result: &Value) -> &Value {
    match result
        .get("data")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
    {
        Some(first) if first.is_object() => first,
        _ => result,
    }
}

fn log_duration(workflow_id: Uuid, activity_id: Uuid, status: &str, start: Instant) {
    let duration = start.elapsed();
    tracing::info!(
        target: "bizflow.performance",
        workflow_id = %workflow_id,
        activity_id = %activity_id,
        phase = "activity",
        status = %status,
        duration_ms = %duration.as_millis(),
        "Activity executed"
    );
}
