//! Activity template record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Configuration key holding the context → input mapping.
pub const INPUT_MAPPING_KEY: &str = "input_mapping";

/// Configuration key holding the output → context mapping.
pub const OUTPUT_MAPPING_KEY: &str = "output_mapping";

/// Read-only definition of what an activity does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ActivityTemplate {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,

    /// Operation code used for executor dispatch.
    pub code: String,

    /// Boolean expression; the activity is skipped when it evaluates false.
    #[sqlx(default)]
    pub condition: Option<String>,

    /// `{"input_mapping": {field: path}, "output_mapping": {field: path}}`
    #[sqlx(default)]
    pub configuration: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
}

impl ActivityTemplate {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            name: name.into(),
            code: code.into(),
            condition: None,
            configuration: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_input_mapping(self, mapping: serde_json::Value) -> Self {
        self.with_config_entry(INPUT_MAPPING_KEY, mapping)
    }

    pub fn with_output_mapping(self, mapping: serde_json::Value) -> Self {
        self.with_config_entry(OUTPUT_MAPPING_KEY, mapping)
    }

    fn with_config_entry(mut self, key: &str, value: serde_json::Value) -> Self {
        let mut config = match self.configuration.take() {
            Some(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        config.insert(key.to_string(), value);
        self.configuration = Some(serde_json::Value::Object(config));
        self
    }

    /// The condition expression, if one is declared and not blank.
    pub fn condition_expression(&self) -> Option<&str> {
        self.condition
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// The trimmed operation code, `None` when blank.
    pub fn operation_code(&self) -> Option<&str> {
        Some(self.code.trim()).filter(|c| !c.is_empty())
    }

    /// Raw input-mapping configuration, if present.
    pub fn input_mapping(&self) -> Option<&serde_json::Value> {
        self.config_entry(INPUT_MAPPING_KEY)
    }

    /// Raw output-mapping configuration, if present.
    pub fn output_mapping(&self) -> Option<&serde_json::Value> {
        self.config_entry(OUTPUT_MAPPING_KEY)
    }

    fn config_entry(&self, key: &str) -> Option<&serde_json::Value> {
        self.configuration
            .as_ref()
            .and_then(|c| c.get(key))
            .filter(|v| !v.is_null())
    }
}
