//! Workflow run record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// A workflow run accumulating every activity's output in `context`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Workflow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub status: String,

    /// `{"stage": {"<n>": {"activity": {"<m>": {"name", "output"}}}}}`
    #[sqlx(default)]
    pub context: Option<serde_json::Value>,

    /// Bumped by every successful store update; guards context writes.
    pub version: i64,

    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Create a running workflow with an empty context.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            name: name.into(),
            status: "running".to_string(),
            context: None,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn with_tenant(mut self, tenant_id: Uuid) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Parse the context document.
    ///
    /// Absent, null and empty-string contexts are an empty object. A context
    /// stored as serialized text is parsed. Anything that is not an object is
    /// rejected.
    pub fn context_document(&self) -> AppResult<serde_json::Map<String, serde_json::Value>> {
        match &self.context {
            None | Some(serde_json::Value::Null) => Ok(serde_json::Map::new()),
            Some(serde_json::Value::Object(map)) => Ok(map.clone()),
            Some(serde_json::Value::String(text)) if text.trim().is_empty() => {
                Ok(serde_json::Map::new())
            }
            Some(serde_json::Value::String(text)) => match serde_json::from_str(text)? {
                serde_json::Value::Object(map) => Ok(map),
                serde_json::Value::Null => Ok(serde_json::Map::new()),
                _ => Err(self.malformed_context()),
            },
            Some(_) => Err(self.malformed_context()),
        }
    }

    fn malformed_context(&self) -> AppError {
        AppError::Validation(format!(
            "Workflow {} context is not a JSON object",
            self.id
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_context_is_empty() {
        let workflow = Workflow::new("onboarding");
        assert!(workflow.context_document().unwrap().is_empty());

        let workflow = Workflow::new("onboarding").with_context(json!(null));
        assert!(workflow.context_document().unwrap().is_empty());

        let workflow = Workflow::new("onboarding").with_context(json!(""));
        assert!(workflow.context_document().unwrap().is_empty());
    }

    #[test]
    fn test_serialized_context_is_parsed() {
        let workflow =
            Workflow::new("onboarding").with_context(json!(r#"{"stage":{"0":{}}}"#));
        let doc = workflow.context_document().unwrap();
        assert_eq!(doc["stage"], json!({"0": {}}));
    }

    #[test]
    fn test_non_object_context_is_rejected() {
        let workflow = Workflow::new("onboarding").with_context(json!([1, 2]));
        assert!(matches!(
            workflow.context_document(),
            Err(AppError::Validation(_))
        ));

        let workflow = Workflow::new("onboarding").with_context(json!("{not json"));
        assert!(matches!(
            workflow.context_document(),
            Err(AppError::Serialization(_))
        ));
    }
}
