//! Decoder traits

use crate::error::Result;
use crate::types::JsonObject;
use serde_json::Value;

/// Extracts raw records from a response body
pub trait RecordDecoder: Send + Sync {
    /// Decode records from a parsed body
    ///
    /// Every selected element must be a JSON object.
    fn decode(&self, body: &Value) -> Result<Vec<JsonObject>>;
}
