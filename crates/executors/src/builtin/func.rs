//! Closure-backed executor.

use std::future::Future;

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::ExecutorError;
use crate::registry::{Executor, RequestEnvelope};

/// Executor backed by an async closure.
///
/// ```ignore
/// registry.register(
///     "entity.client.create",
///     FnExecutor::new(|_ctx, request| async move {
///         Ok(serde_json::json!({"data": [{"id": "c1", "name": request.data["name"]}]}))
///     }),
/// );
/// ```
pub struct FnExecutor<F> {
    func: F,
}

impl<F, Fut> FnExecutor<F>
where
    F: Fn(ExecutionContext, RequestEnvelope) -> Fut + Send + Sync,
    Fut: Future<Output = Result<serde_json::Value, ExecutorError>> + Send + 'static,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> Executor for FnExecutor<F>
where
    F: Fn(ExecutionContext, RequestEnvelope) -> Fut + Send + Sync,
    Fut: Future<Output = Result<serde_json::Value, ExecutorError>> + Send + 'static,
{
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        request: RequestEnvelope,
    ) -> Result<serde_json::Value, ExecutorError> {
        (self.func)(ctx.clone(), request).await
    }
}
