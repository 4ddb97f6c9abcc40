//! Response decoder module
//!
//! Extracts records from a parsed JSON response body using a configured path.
//! Paths with wildcards (`$.results[*]`) are evaluated with `jsonpath-rust`;
//! plain dotted paths are walked directly.

mod decoders;
mod types;

pub use decoders::{select_scalar, JsonDecoder};
pub use types::RecordDecoder;
