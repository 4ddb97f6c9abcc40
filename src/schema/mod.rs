//! Declarative JSON Schema module
//!
//! Record schemas are declared in code with a small builder. Every property
//! is nullable unless stated otherwise, matching how the Codecov API omits or
//! nulls fields it has no value for.

mod types;

pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};
