//! Boolean condition expressions evaluated against a workflow context.
//!
//! Expressions use Jinja2 expression syntax (`amount > 100`,
//! `stage["0"].activity["1"].output.status == "approved"`). A condition may
//! also be written wrapped in `{{ }}`. Top-level context keys are exposed as
//! variables, and the whole document is also available as `context`.

use std::collections::HashMap;

use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior, Value};
use regex::Regex;
use serde_json::Map;

use crate::config::EngineConfig;
use crate::error::{AppError, AppResult};

/// Result of checking an activity's condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionOutcome {
    /// Evaluated truthy.
    Proceed,
    /// Evaluated falsy; the activity is skipped.
    Skip,
    /// Could not be evaluated. The activity runs anyway (fail-open).
    EvalFailed(String),
}

impl ConditionOutcome {
    /// Whether the activity should run.
    pub fn should_run(&self) -> bool {
        !matches!(self, Self::Skip)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proceed => "proceed",
            Self::Skip => "skip",
            Self::EvalFailed(_) => "eval_failed",
        }
    }
}

/// Sandboxed expression evaluator.
///
/// Evaluation is pure: no I/O, no side effects, and bounded by the fuel
/// budget so a pathological expression cannot stall the engine.
pub struct ConditionEvaluator {
    env: Environment<'static>,
}

impl std::fmt::Debug for ConditionEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionEvaluator").finish_non_exhaustive()
    }
}

impl ConditionEvaluator {
    /// Create an evaluator with the given instruction budget.
    pub fn new(fuel: u64) -> AppResult<Self> {
        if fuel == 0 {
            return Err(AppError::Config(
                "condition fuel must be greater than zero".to_string(),
            ));
        }

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_fuel(Some(fuel));
        env.add_test("matches", test_matches);

        Ok(Self { env })
    }

    /// Build the evaluator described by the engine configuration.
    pub fn from_config(config: &EngineConfig) -> AppResult<Self> {
        if !config.conditions_enabled {
            return Err(AppError::Config(
                "condition evaluation is disabled".to_string(),
            ));
        }
        Self::new(config.condition_fuel)
    }

    /// Evaluate `expression` for truthiness.
    pub fn evaluate_bool(
        &self,
        expression: &str,
        context: &Map<String, serde_json::Value>,
    ) -> AppResult<bool> {
        let source = strip_delimiters(expression);
        let compiled = self
            .env
            .compile_expression(source)
            .map_err(|e| AppError::BadRequest(format!("Condition parse error: {}", e)))?;

        let value = compiled
            .eval(context_to_value(context))
            .map_err(|e| AppError::BadRequest(format!("Condition evaluation error: {}", e)))?;

        Ok(value.is_true())
    }

    /// Evaluate `expression` into a three-way outcome.
    pub fn evaluate(
        &self,
        expression: &str,
        context: &Map<String, serde_json::Value>,
    ) -> ConditionOutcome {
        match self.evaluate_bool(expression, context) {
            Ok(true) => ConditionOutcome::Proceed,
            Ok(false) => ConditionOutcome::Skip,
            Err(e) => ConditionOutcome::EvalFailed(e.to_string()),
        }
    }
}

/// Remove an enclosing `{{ ... }}` pair, if present.
fn strip_delimiters(expression: &str) -> &str {
    let trimmed = expression.trim();
    trimmed
        .strip_prefix("{{")
        .and_then(|s| s.strip_suffix("}}"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// Expose top-level keys as variables plus the whole document as `context`.
fn context_to_value(context: &Map<String, serde_json::Value>) -> Value {
    let mut vars: HashMap<String, Value> = context
        .iter()
        .map(|(k, v)| (k.clone(), json_value_to_minijinja(v)))
        .collect();
    vars.insert(
        "context".to_string(),
        json_value_to_minijinja(&serde_json::Value::Object(context.clone())),
    );
    Value::from_object(vars)
}

fn json_value_to_minijinja(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::from(()),
        serde_json::Value::Bool(b) => Value::from(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(f) = n.as_f64() {
                Value::from(f)
            } else {
                Value::UNDEFINED
            }
        }
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Array(arr) => {
            let items: Vec<Value> = arr.iter().map(json_value_to_minijinja).collect();
            Value::from(items)
        }
        serde_json::Value::Object(map) => {
            let items: HashMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), json_value_to_minijinja(v)))
                .collect();
            Value::from_object(items)
        }
    }
}

/// `value is matches("^c-")`: regex search on the value's string form.
fn test_matches(value: &Value, pattern: &str) -> Result<bool, Error> {
    if value.is_undefined() || value.is_none() {
        return Ok(false);
    }
    let regex = Regex::new(pattern).map_err(|e| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid pattern '{}': {}", pattern, e),
        )
    })?;
    let text = match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    };
    Ok(regex.is_match(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn evaluator() -> ConditionEvaluator {
        ConditionEvaluator::new(50_000).unwrap()
    }

    fn ctx(value: serde_json::Value) -> Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("context must be an object"),
        }
    }

    #[test]
    fn test_comparison() {
        let evaluator = evaluator();
        let context = ctx(json!({"amount": 150}));

        assert_eq!(evaluator.evaluate("amount > 100", &context), ConditionOutcome::Proceed);
        assert_eq!(evaluator.evaluate("amount > 200", &context), ConditionOutcome::Skip);
    }

    #[test]
    fn test_wrapped_expression() {
        let evaluator = evaluator();
        let context = ctx(json!({"approved": true}));
        assert_eq!(
            evaluator.evaluate("{{ approved }}", &context),
            ConditionOutcome::Proceed
        );
    }

    #[test]
    fn test_stage_output_reference() {
        let evaluator = evaluator();
        let context = ctx(json!({
            "stage": {"0": {"activity": {"0": {"name": "Check", "output": {"status": "approved"}}}}}
        }));

        assert!(evaluator
            .evaluate_bool(r#"stage["0"].activity["0"].output.status == "approved""#, &context)
            .unwrap());
        assert!(evaluator
            .evaluate_bool(
                r#"context.stage["0"].activity["0"].output.status == "approved""#,
                &context
            )
            .unwrap());
    }

    #[test]
    fn test_missing_reference_is_falsy() {
        let evaluator = evaluator();
        let context = ctx(json!({}));

        assert_eq!(
            evaluator.evaluate(r#"stage["9"].activity["0"].output.flag"#, &context),
            ConditionOutcome::Skip
        );
        assert_eq!(
            evaluator.evaluate("stage is defined", &context),
            ConditionOutcome::Skip
        );
    }

    #[test]
    fn test_matches_test() {
        let evaluator = evaluator();
        let context = ctx(json!({"client_id": "c-42"}));

        assert!(evaluator
            .evaluate_bool(r#"client_id is matches("^c-\\d+$")"#, &context)
            .unwrap());
        assert!(!evaluator
            .evaluate_bool(r#"missing is matches("^c-")"#, &context)
            .unwrap());
    }

    #[test]
    fn test_parse_error_is_eval_failed() {
        let evaluator = evaluator();
        let outcome = evaluator.evaluate("amount >", &ctx(json!({"amount": 1})));
        assert!(matches!(outcome, ConditionOutcome::EvalFailed(_)));
        assert!(outcome.should_run());
    }

    #[test]
    fn test_unknown_filter_is_eval_failed() {
        let evaluator = evaluator();
        let outcome = evaluator.evaluate("amount | no_such_filter", &ctx(json!({"amount": 1})));
        assert!(matches!(outcome, ConditionOutcome::EvalFailed(_)));
    }

    #[test]
    fn test_zero_fuel_is_rejected() {
        assert!(matches!(ConditionEvaluator::new(0), Err(AppError::Config(_))));
    }

    #[test]
    fn test_disabled_by_config() {
        let config = EngineConfig {
            conditions_enabled: false,
            ..EngineConfig::default()
        };
        assert!(ConditionEvaluator::from_config(&config).is_err());
        assert!(ConditionEvaluator::from_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_strip_delimiters() {
        assert_eq!(strip_delimiters("  {{ a == 1 }} "), "a == 1");
        assert_eq!(strip_delimiters("a == 1"), "a == 1");
    }
}
