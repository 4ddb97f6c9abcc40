//! Stream definition
//!
//! A [`StreamDefinition`] is the explicit, per-entity configuration that the
//! generic fetch loop and the sync engine are driven by.

use crate::context::Context;
use crate::decode::JsonDecoder;
use crate::error::{Error, Result};
use crate::http::ResponsePolicy;
use crate::pagination::{HateoasPager, Pager};
use crate::schema::JsonSchema;
use crate::template;
use crate::types::{JsonObject, QueryParams, ReplicationMethod};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

/// Default record path for Codecov list endpoints
pub const DEFAULT_RECORDS_PATH: &str = "$.results[*]";

/// Derives the context for child streams from one emitted record
pub type ChildContextFn = fn(&JsonObject, &Context) -> Result<Context>;

/// Transforms a raw record; `Ok(None)` drops it
pub type PostProcessFn = fn(JsonObject, &Context) -> Result<Option<JsonObject>>;

/// Pass a record through unchanged
pub fn identity(record: JsonObject, _context: &Context) -> Result<Option<JsonObject>> {
    Ok(Some(record))
}

/// Static configuration of one entity stream
#[derive(Clone)]
pub struct StreamDefinition {
    /// Stream name (`tap_stream_id`)
    pub name: String,
    /// Path template relative to the API base URL
    pub path: String,
    /// Name of the parent stream, if any
    pub parent: Option<String>,
    /// Primary key fields
    pub primary_keys: Vec<String>,
    /// Replication strategy
    pub replication_method: ReplicationMethod,
    /// Replication key field (required for incremental streams)
    pub replication_key: Option<String>,
    /// Static query parameters sent with every request
    pub default_params: QueryParams,
    /// Context keys forwarded as query parameters
    pub params_from_context: Vec<String>,
    /// Status classification
    pub policy: ResponsePolicy,
    /// Record extraction
    pub decoder: JsonDecoder,
    /// Page boundary detection
    pub pager: Arc<dyn Pager>,
    /// Record schema
    pub schema: JsonSchema,
    /// Child context derivation
    pub child_context: Option<ChildContextFn>,
    /// Record post-processing
    pub post_process: PostProcessFn,
}

impl StreamDefinition {
    /// Create a root stream with Codecov defaults
    ///
    /// Records are read from `$.results[*]` and pages follow the body's `next` link.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            parent: None,
            primary_keys: Vec::new(),
            replication_method: ReplicationMethod::FullTable,
            replication_key: None,
            default_params: Vec::new(),
            params_from_context: Vec::new(),
            policy: ResponsePolicy::default(),
            decoder: JsonDecoder::with_path(DEFAULT_RECORDS_PATH),
            pager: Arc::new(HateoasPager::default()),
            schema: JsonSchema::new(),
            child_context: None,
            post_process: identity,
        }
    }

    /// Set the parent stream
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the primary key fields
    #[must_use]
    pub fn primary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Replicate incrementally on `key`
    #[must_use]
    pub fn incremental(mut self, key: impl Into<String>) -> Self {
        self.replication_method = ReplicationMethod::Incremental;
        self.replication_key = Some(key.into());
        self
    }

    /// Add a static query parameter
    #[must_use]
    pub fn default_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_params.push((key.into(), value.into()));
        self
    }

    /// Forward these context keys as query parameters
    #[must_use]
    pub fn params_from_context<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params_from_context = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Treat these statuses as "no data"
    #[must_use]
    pub fn tolerate(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.policy = self.policy.tolerate(statuses);
        self
    }

    /// Read records from a different JSONPath
    #[must_use]
    pub fn records_path(mut self, path: impl Into<String>) -> Self {
        self.decoder = JsonDecoder::with_path(path);
        self
    }

    /// Use a different pager
    #[must_use]
    pub fn pager(mut self, pager: impl Pager + 'static) -> Self {
        self.pager = Arc::new(pager);
        self
    }

    /// Set the record schema
    #[must_use]
    pub fn schema(mut self, schema: JsonSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Set the child context derivation
    #[must_use]
    pub fn child_context(mut self, derive: ChildContextFn) -> Self {
        self.child_context = Some(derive);
        self
    }

    /// Set the post-processor
    #[must_use]
    pub fn post_process(mut self, process: PostProcessFn) -> Self {
        self.post_process = process;
        self
    }

    /// Whether progress is tracked with bookmarks
    pub fn is_incremental(&self) -> bool {
        self.replication_method == ReplicationMethod::Incremental
    }

    /// Check the definition is internally consistent
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::catalog("stream name must not be empty"));
        }
        if self.parent.is_none() && template::has_placeholders(&self.path) {
            return Err(Error::catalog(format!(
                "root stream '{}' has no parent to supply {}",
                self.name,
                template::extract_variables(&self.path).join(", ")
            )));
        }
        if self.is_incremental() && self.replication_key.is_none() {
            return Err(Error::catalog(format!(
                "stream '{}' is INCREMENTAL but has no replication key",
                self.name
            )));
        }
        Ok(())
    }

    /// Catalog entry for discovery output
    pub fn catalog_entry(&self) -> Value {
        json!({
            "tap_stream_id": self.name,
            "stream": self.name,
            "schema": self.schema.to_json(),
            "key_properties": self.primary_keys,
            "replication_method": self.replication_method,
            "replication_key": self.replication_key,
            "parent_stream": self.parent,
        })
    }
}

impl fmt::Debug for StreamDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDefinition")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("parent", &self.parent)
            .field("primary_keys", &self.primary_keys)
            .field("replication_method", &self.replication_method)
            .field("replication_key", &self.replication_key)
            .field("default_params", &self.default_params)
            .field("params_from_context", &self.params_from_context)
            .field("policy", &self.policy)
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}
