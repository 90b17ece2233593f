//! Workflow context layout.
//!
//! Every completed activity records its mapped output at
//! `stage.<stage_order_index>.activity.<order_index>` as `{name, output}`.
//! Indices are decimal string keys. Writes replace only that entry and keep
//! every sibling.

use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

pub const STAGE_KEY: &str = "stage";
pub const ACTIVITY_KEY: &str = "activity";

/// Record `output` for one activity in the context document.
pub fn set_activity_output(
    document: &mut Map<String, Value>,
    stage_index: i32,
    activity_index: i32,
    name: &str,
    output: Value,
) -> AppResult<()> {
    let stages = child_object(document, STAGE_KEY)?;
    let stage = child_object(stages, &stage_index.to_string())?;
    let activities = child_object(stage, ACTIVITY_KEY)?;

    activities.insert(
        activity_index.to_string(),
        serde_json::json!({
            "name": name,
            "output": output,
        }),
    );
    Ok(())
}

/// The recorded entry for one activity, if any.
pub fn activity_entry(
    document: &Map<String, Value>,
    stage_index: i32,
    activity_index: i32,
) -> Option<&Value> {
    document
        .get(STAGE_KEY)?
        .get(stage_index.to_string())?
        .get(ACTIVITY_KEY)?
        .get(activity_index.to_string())
}

/// Get or create the object stored under `key`. An existing non-object value
/// is never overwritten.
fn child_object<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
) -> AppResult<&'a mut Map<String, Value>> {
    let slot = parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    match slot {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Validation(format!(
            "Workflow context entry '{}' is a {}, expected an object",
            key,
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
