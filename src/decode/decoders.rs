//! Decoder implementations

use super::types::RecordDecoder;
use crate::error::{Error, Result};
use crate::types::{scalar_to_string, JsonObject};
use serde_json::Value;

/// JSON decoder with optional record path extraction
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    /// JSONPath to extract records
    record_path: Option<String>,
}

impl JsonDecoder {
    /// Create a JSON decoder that treats the whole body as the record set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: Some(path.into()),
        }
    }

    /// The configured record path, if any
    pub fn record_path(&self) -> Option<&str> {
        self.record_path.as_deref()
    }

    /// Select the raw values at the record path
    fn select(&self, value: &Value) -> Result<Vec<Value>> {
        match &self.record_path {
            Some(path) if path.contains('*') => extract_with_jsonpath(value, path),
            Some(path) => match extract_simple_path(value, path) {
                Some(Value::Array(arr)) => Ok(arr),
                Some(Value::Null) | None => Ok(vec![]),
                Some(v) => Ok(vec![v]),
            },
            None => match value {
                Value::Array(arr) => Ok(arr.clone()),
                _ => Ok(vec![value.clone()]),
            },
        }
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode(&self, body: &Value) -> Result<Vec<JsonObject>> {
        self.select(body)?
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                other => Err(Error::RecordExtraction {
                    path: self.record_path.clone().unwrap_or_else(|| "$".to_string()),
                    message: format!("expected a JSON object, found {other}"),
                }),
            })
            .collect()
    }
}

/// Select a scalar at a dotted path and render it as a string
///
/// Returns `None` when the path is missing or points at null, an object or an array.
pub fn select_scalar(value: &Value, path: &str) -> Option<String> {
    extract_simple_path(value, path).as_ref().and_then(scalar_to_string)
}

/// Walk a dotted path such as `$.files` or `data.items[0]`
fn extract_simple_path(value: &Value, path: &str) -> Option<Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value.clone());
    }

    let mut current = value;
    for part in path.split('.') {
        if let Some(bracket_pos) = part.find('[') {
            let name = &part[..bracket_pos];
            let index_str = part[bracket_pos + 1..].trim_end_matches(']');

            if !name.is_empty() {
                current = current.get(name)?;
            }

            let index: usize = index_str.parse().ok()?;
            current = current.as_array()?.get(index)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current.clone())
}

/// Evaluate a wildcard JSONPath expression
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path).map_err(|e| Error::JsonPath {
        message: format!("Invalid JSONPath '{path}': {e}"),
    })?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}
