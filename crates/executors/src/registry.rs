//! Executor registry and dispatch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::error::ExecutorError;

/// Calling convention shared by every registered operation: the resolved
/// input travels under a single `data` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Resolved activity input.
    pub data: serde_json::Value,
}

impl RequestEnvelope {
    /// Wrap a resolved input.
    pub fn new(data: serde_json::Value) -> Self {
        Self { data }
    }
}

/// A callable business operation.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run the operation. The returned value is the raw operation result.
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        request: RequestEnvelope,
    ) -> Result<serde_json::Value, ExecutorError>;
}

/// Lookup table from operation code to executor.
///
/// Built once by wiring code, then shared read-only behind an `Arc`.
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn Executor>>,
}

impl ExecutorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Register an executor under an operation code.
    pub fn register<E: Executor + 'static>(
        &mut self,
        code: impl Into<String>,
        executor: E,
    ) -> &mut Self {
        self.register_arc(code, Arc::new(executor))
    }

    /// Register a shared executor under an operation code.
    pub fn register_arc(
        &mut self,
        code: impl Into<String>,
        executor: Arc<dyn Executor>,
    ) -> &mut Self {
        let code = code.into();
        if self.executors.insert(code.clone(), executor).is_some() {
            tracing::warn!(code = %code, "Executor registration replaced an existing entry");
        }
        self
    }

    /// Get an executor by operation code.
    pub fn get(&self, code: &str) -> Result<Arc<dyn Executor>, ExecutorError> {
        self.executors
            .get(code)
            .cloned()
            .ok_or_else(|| ExecutorError::NotFound(code.to_string()))
    }

    /// Check if a code is registered.
    pub fn has(&self, code: &str) -> bool {
        self.executors.contains_key(code)
    }

    /// List all registered codes, sorted.
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.executors.keys().map(|s| s.as_str()).collect();
        codes.sort_unstable();
        codes
    }

    /// Number of registered codes.
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    /// Resolve and run an executor by code.
    pub async fn execute(
        &self,
        code: &str,
        ctx: &ExecutionContext,
        request: RequestEnvelope,
    ) -> Result<serde_json::Value, ExecutorError> {
        let executor = self.get(code)?;
        executor.execute(ctx, request).await
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("codes", &self.codes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockExecutor;

    #[async_trait]
    impl Executor for MockExecutor {
        async fn execute(
            &self,
            _ctx: &ExecutionContext,
            request: RequestEnvelope,
        ) -> Result<serde_json::Value, ExecutorError> {
            Ok(serde_json::json!({"mock": true, "echo": request.data}))
        }
    }

    #[test]
    fn test_registry_new() {
        let registry = ExecutorRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.codes().is_empty());
    }

    #[test]
    fn test_registry_register() {
        let mut registry = ExecutorRegistry::new();
        registry
            .register("entity.client.create", MockExecutor)
            .register("entity.client.update", MockExecutor);

        assert!(registry.has("entity.client.create"));
        assert!(!registry.has("entity.invoice.create"));
        assert_eq!(
            registry.codes(),
            vec!["entity.client.create", "entity.client.update"]
        );
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_registry_execute() {
        let mut registry = ExecutorRegistry::new();
        registry.register("mock", MockExecutor);

        let ctx = ExecutionContext::default();
        let result = registry
            .execute("mock", &ctx, RequestEnvelope::new(serde_json::json!({"a": 1})))
            .await
            .unwrap();
        assert_eq!(result["echo"]["a"], 1);
    }

    #[tokio::test]
    async fn test_registry_get_not_found() {
        let registry = ExecutorRegistry::new();
        let result = registry.get("unknown");
        assert!(matches!(result, Err(ExecutorError::NotFound(code)) if code == "unknown"));
    }

    #[test]
    fn test_envelope_serialization() {
        let envelope = RequestEnvelope::new(serde_json::json!({"name": "Acme"}));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json, serde_json::json!({"data": {"name": "Acme"}}));
    }
}
