//! Engine types
//!
//! Message types and configuration for the sync engine.

use crate::types::JsonObject;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A message emitted during sync
///
/// Serializes to the JSON-lines envelope, e.g.
/// `{"type":"RECORD","stream":"commits","record":{...},"time_extracted":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Stream schema, sent before any record of the stream
    Schema {
        /// Stream name
        stream: String,
        /// JSON Schema of the records
        schema: Value,
        /// Primary key fields
        key_properties: Vec<String>,
        /// Replication key fields
        bookmark_properties: Vec<String>,
    },
    /// One record
    Record {
        /// Stream name
        stream: String,
        /// The record
        record: JsonObject,
        /// When the record was extracted
        time_extracted: DateTime<Utc>,
    },
    /// Bookmark checkpoint
    State {
        /// Full state document
        value: Value,
    },
}

impl Message {
    /// Create a schema message
    pub fn schema(
        stream: impl Into<String>,
        schema: Value,
        key_properties: Vec<String>,
        bookmark_properties: Vec<String>,
    ) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties,
            bookmark_properties,
        }
    }

    /// Create a record message stamped with the current time
    pub fn record(stream: impl Into<String>, record: JsonObject) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: Utc::now(),
        }
    }

    /// Create a state message
    pub fn state(value: Value) -> Self {
        Self::State { value }
    }

    /// Stream this message belongs to, if any
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }
}

/// Configuration for sync operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Streams whose records are emitted (`None` = all)
    pub selected_streams: Option<Vec<String>>,
    /// Whether to send SCHEMA messages before the records
    pub emit_schemas: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            selected_streams: None,
            emit_schemas: true,
        }
    }
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit only these streams; their ancestors are still traversed
    #[must_use]
    pub fn with_streams<I, S>(mut self, streams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_streams = Some(streams.into_iter().map(Into::into).collect());
        self
    }

    /// Enable or disable SCHEMA messages
    #[must_use]
    pub fn with_schemas(mut self, emit: bool) -> Self {
        self.emit_schemas = emit;
        self
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Records emitted per stream
    pub records: BTreeMap<String, usize>,
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Responses answered with a tolerated status
    pub tolerated_responses: usize,
    /// Stream invocations (one per context)
    pub partitions_synced: usize,
    /// Incremental partitions skipped because a bookmark existed
    pub partitions_skipped: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one emitted record
    pub fn add_record(&mut self, stream: &str) {
        *self.records.entry(stream.to_string()).or_default() += 1;
    }

    /// Records emitted for a stream
    pub fn records_for(&self, stream: &str) -> usize {
        self.records.get(stream).copied().unwrap_or_default()
    }

    /// Records emitted across all streams
    pub fn total_records(&self) -> usize {
        self.records.values().sum()
    }

    /// Count a synced partition
    pub fn add_partition(&mut self) {
        self.partitions_synced += 1;
    }

    /// Count a skipped partition
    pub fn add_skipped_partition(&mut self) {
        self.partitions_skipped += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
