//! Declarative field → path projection between JSON documents.
//!
//! Path grammar:
//!
//! ```text
//! path     := "$" | ["$."] segment ( "." segment | "[" index "]" )*
//! segment  := ident | "[" index "]"
//! index    := digits | '"' chars '"' | "'" chars "'"
//! ```
//!
//! Numeric segments select array elements on arrays and the decimal string
//! key on objects, so `stage.0.activity.1` and `stage[0].activity[1]` address
//! the same entry of a workflow context. Only canonical decimals count as
//! numeric: a dot segment such as `00` or `+1` is a plain key, and a bracket
//! index with a sign or leading zero is rejected. Wildcards are not supported.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

/// A path that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path '{path}': {reason}")]
pub struct PathError {
    pub path: String,
    pub reason: String,
}

impl PathError {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// A mapping configuration that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("mapping must be an object of field -> path")]
    NotAnObject,

    #[error("path for field '{0}' must be a string")]
    NonStringPath(String),

    #[error(transparent)]
    InvalidPath(#[from] PathError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextPath {
    raw: String,
    segments: Vec<Segment>,
}

impl ContextPath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PathError::new(raw, "path is empty"));
        }

        let body = if trimmed == "$" {
            ""
        } else if let Some(rest) = trimmed.strip_prefix("$.") {
            if rest.is_empty() {
                return Err(PathError::new(raw, "empty segment"));
            }
            rest
        } else if trimmed.starts_with("$[") {
            &trimmed[1..]
        } else {
            trimmed
        };

        Ok(Self {
            raw: trimmed.to_string(),
            segments: parse_segments(raw, body)?,
        })
    }

    /// Whether the path selects the whole document.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Select the value at this path, `None` when any step is missing.
    pub fn select<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(document, |current, segment| match (segment, current) {
                (Segment::Key(key), Value::Object(map)) => map.get(key),
                (Segment::Index(n), Value::Array(items)) => items.get(*n),
                (Segment::Index(n), Value::Object(map)) => map.get(&n.to_string()),
                _ => None,
            })
    }
}

impl FromStr for ContextPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ContextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_segments(raw: &str, body: &str) -> Result<Vec<Segment>, PathError> {
    let chars: Vec<char> = body.chars().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '[' => {
                let close = find_bracket_close(raw, &chars, i)?;
                segments.push(parse_bracket(raw, &chars[i + 1..close])?);
                i = close + 1;
            }
            '.' if !segments.is_empty() => {
                let (segment, next) = read_ident(raw, &chars, i + 1)?;
                segments.push(segment);
                i = next;
            }
            '.' => return Err(PathError::new(raw, "path cannot start with '.'")),
            ']' => return Err(PathError::new(raw, "unexpected ']'")),
            _ if segments.is_empty() => {
                let (segment, next) = read_ident(raw, &chars, i)?;
                segments.push(segment);
                i = next;
            }
            c => {
                return Err(PathError::new(
                    raw,
                    format!("unexpected '{}' after ']'", c),
                ))
            }
        }
    }

    Ok(segments)
}

fn read_ident(raw: &str, chars: &[char], start: usize) -> Result<(Segment, usize), PathError> {
    let mut end = start;
    while end < chars.len() && !matches!(chars[end], '.' | '[' | ']') {
        end += 1;
    }
    if end == start {
        return Err(PathError::new(raw, "empty segment"));
    }

    let ident: String = chars[start..end].iter().collect();
    let segment = match canonical_index(&ident) {
        Some(n) => Segment::Index(n),
        None => Segment::Key(ident),
    };
    Ok((segment, end))
}

fn find_bracket_close(raw: &str, chars: &[char], open: usize) -> Result<usize, PathError> {
    let first = open + 1;
    match chars.get(first) {
        Some(&quote @ ('"' | '\'')) => {
            let close_quote = chars[first + 1..]
                .iter()
                .position(|&c| c == quote)
                .map(|p| first + 1 + p)
                .ok_or_else(|| PathError::new(raw, "unterminated quoted key"))?;
            match chars.get(close_quote + 1) {
                Some(']') => Ok(close_quote + 1),
                _ => Err(PathError::new(raw, "expected ']' after quoted key")),
            }
        }
        _ => chars[first..]
            .iter()
            .position(|&c| c == ']')
            .map(|p| first + p)
            .ok_or_else(|| PathError::new(raw, "unclosed '['")),
    }
}

fn parse_bracket(raw: &str, inner: &[char]) -> Result<Segment, PathError> {
    match inner {
        [] => Err(PathError::new(raw, "empty brackets")),
        [q, key @ .., end] if (*q == '"' || *q == '\'') && q == end => {
            Ok(Segment::Key(key.iter().collect()))
        }
        _ => {
            let text: String = inner.iter().collect();
            canonical_index(text.trim()).map(Segment::Index).ok_or_else(|| {
                PathError::new(raw, "bracket index must be a number or a quoted key")
            })
        }
    }
}

/// Plain decimal without sign or leading zeros.
fn canonical_index(text: &str) -> Option<usize> {
    let digits_only = !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit());
    if !digits_only || (text.len() > 1 && text.starts_with('0')) {
        return None;
    }
    text.parse().ok()
}

/// Compiled target-field → path mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathMapping {
    entries: Vec<(String, ContextPath)>,
}

impl PathMapping {
    /// Compile a mapping configuration. Absent or null ⇒ empty mapping.
    pub fn from_config(config: Option<&Value>) -> Result<Self, MappingError> {
        let map = match config {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(MappingError::NotAnObject),
        };

        let entries = map
            .iter()
            .map(|(field, path)| {
                let path = path
                    .as_str()
                    .ok_or_else(|| MappingError::NonStringPath(field.clone()))?;
                Ok((field.clone(), ContextPath::parse(path)?))
            })
            .collect::<Result<Vec<_>, MappingError>>()?;

        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Projects a source document into a target document through a mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextPathResolver;

impl ContextPathResolver {
    pub fn new() -> Self {
        Self
    }

    /// Build `{field: source[path]}` for every mapping entry whose path
    /// resolves. Unresolved paths are omitted.
    pub fn resolve(&self, source: &Value, mapping: &PathMapping) -> Value {
        let mut target = Map::new();
        for (field, path) in &mapping.entries {
            match path.select(source) {
                Some(value) => {
                    target.insert(field.clone(), value.clone());
                }
                None => {
                    tracing::trace!(field = %field, path = %path, "Mapping path did not resolve");
                }
            }
        }
        Value::Object(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(config: Value) -> PathMapping {
        PathMapping::from_config(Some(&config)).unwrap()
    }

    #[test]
    fn test_resolve_nested_key() {
        let resolver = ContextPathResolver::new();
        let result = resolver.resolve(&json!({"a": {"b": 5}}), &mapping(json!({"x": "a.b"})));
        assert_eq!(result, json!({"x": 5}));
    }

    #[test]
    fn test_unresolved_path_is_omitted() {
        let resolver = ContextPathResolver::new();
        let result = resolver.resolve(
            &json!({"a": {"b": 5}}),
            &mapping(json!({"x": "a.b", "y": "a.c.d", "z": "missing"})),
        );
        assert_eq!(result, json!({"x": 5}));
    }

    #[test]
    fn test_empty_and_absent_mapping() {
        let resolver = ContextPathResolver::new();
        let source = json!({"a": 1});

        let absent = PathMapping::from_config(None).unwrap();
        assert!(absent.is_empty());
        assert_eq!(resolver.resolve(&source, &absent), json!({}));

        let null = PathMapping::from_config(Some(&Value::Null)).unwrap();
        assert_eq!(resolver.resolve(&source, &null), json!({}));

        assert_eq!(resolver.resolve(&source, &mapping(json!({}))), json!({}));
    }

    #[test]
    fn test_stage_activity_addressing() {
        let context = json!({
            "stage": {"0": {"activity": {"1": {"name": "Create client", "output": {"client_id": "c1"}}}}}
        });
        let resolver = ContextPathResolver::new();

        let dotted = resolver.resolve(
            &context,
            &mapping(json!({"client": "stage.0.activity.1.output.client_id"})),
        );
        let bracketed = resolver.resolve(
            &context,
            &mapping(json!({"client": "stage[0].activity[1].output.client_id"})),
        );
        assert_eq!(dotted, json!({"client": "c1"}));
        assert_eq!(dotted, bracketed);
    }

    #[test]
    fn test_array_index_and_quoted_key() {
        let source = json!({
            "data": [{"id": "c1"}, {"id": "c2"}],
            "weird.key": {"v": true}
        });
        let resolver = ContextPathResolver::new();
        let result = resolver.resolve(
            &source,
            &mapping(json!({
                "second": "data[1].id",
                "first": "data.0.id",
                "flag": "[\"weird.key\"].v",
                "out_of_range": "data[5].id"
            })),
        );
        assert_eq!(result, json!({"second": "c2", "first": "c1", "flag": true}));
    }

    #[test]
    fn test_root_and_null_values() {
        let source = json!({"a": null, "b": 2});
        let resolver = ContextPathResolver::new();
        let result = resolver.resolve(&source, &mapping(json!({"all": "$", "a": "$.a"})));
        assert_eq!(result, json!({"all": {"a": null, "b": 2}, "a": null}));
    }

    #[test]
    fn test_invalid_paths() {
        for bad in [
            "", "$.", "a.", "a..b", ".a", "a[", "a[x]", "a[]", "a]b", "a[0]b", "a[\"k]", "a[+1]",
            "a[01]",
        ] {
            assert!(ContextPath::parse(bad).is_err(), "expected '{}' to be rejected", bad);
        }
        assert!(ContextPath::parse("$").unwrap().is_root());
    }

    #[test]
    fn test_non_canonical_numbers_are_keys() {
        let source = json!({"stage": {"0": "zero", "00": "padded", "+1": "signed"}});
        let resolver = ContextPathResolver::new();
        let result = resolver.resolve(
            &source,
            &mapping(json!({"a": "stage.0", "b": "stage.00", "c": "stage.+1"})),
        );
        assert_eq!(result, json!({"a": "zero", "b": "padded", "c": "signed"}));
    }

    #[test]
    fn test_invalid_mapping_config() {
        assert_eq!(
            PathMapping::from_config(Some(&json!(["a"]))),
            Err(MappingError::NotAnObject)
        );
        assert_eq!(
            PathMapping::from_config(Some(&json!({"x": 1}))),
            Err(MappingError::NonStringPath("x".to_string()))
        );
        assert!(matches!(
            PathMapping::from_config(Some(&json!({"x": "a..b"}))),
            Err(MappingError::InvalidPath(_))
        ));
    }
}
