//! Echo executor.

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::ExecutorError;
use crate::registry::{Executor, RequestEnvelope};

/// Returns the request data wrapped as `{"data": [data]}`, the same result
/// shape entity operations produce.
#[derive(Debug, Clone, Default)]
pub struct EchoExecutor;

impl EchoExecutor {
    pub const CODE: &'static str = "system.echo";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for EchoExecutor {
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        request: RequestEnvelope,
    ) -> Result<serde_json::Value, ExecutorError> {
        tracing::debug!(request_id = %ctx.request_id, "Echo executor invoked");
        Ok(serde_json::json!({ "data": [request.data] }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo() {
        let executor = EchoExecutor::new();
        let ctx = ExecutionContext::default();
        let result = executor
            .execute(&ctx, RequestEnvelope::new(serde_json::json!({"id": "c1"})))
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!({"data": [{"id": "c1"}]}));
    }
}
