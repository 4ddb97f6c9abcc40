//! Entity stream module
//!
//! A stream binds a path template, a pager, a decoder and a post-processor to
//! one entity type.
//!
//! # Overview
//!
//! - [`StreamDefinition`] - explicit per-entity configuration
//! - [`RecordFetcher`] - the shared request/response/pagination loop
//! - [`composite_key`] - identity keys for entities without a row id

mod fetcher;
mod keys;
mod types;

pub use fetcher::{Page, RecordFetcher};
pub use keys::{composite_key, escape_key_part, KEY_SEPARATOR};
pub use types::{
    identity, ChildContextFn, PostProcessFn, StreamDefinition, DEFAULT_RECORDS_PATH,
};

#[cfg(test)]
mod tests;
