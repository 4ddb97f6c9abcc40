//! Execution engine module
//!
//! Depth-first traversal of the stream hierarchy.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Drives root streams and recurses into children per record
//! - `SyncConfig` - Stream selection and output options
//! - `Message` - SCHEMA / RECORD / STATE messages handed to a sink
//!
//! Every request is awaited before the next one is built, so records leave
//! the engine in traversal order: a parent record is followed by all of its
//! descendants before the parent's next sibling.

mod types;

pub use types::{Message, SyncConfig, SyncStats};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::output::MessageSink;
use crate::state::StateManager;
use crate::stream::{RecordFetcher, StreamDefinition};
use crate::types::scalar_to_string;
use futures::future::{BoxFuture, FutureExt};
use futures::TryStreamExt;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info};

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// Shared fetch loop
    fetcher: RecordFetcher,
    /// Stream definitions, parents before children
    streams: Vec<StreamDefinition>,
    /// State manager
    state: StateManager,
    /// Sync configuration
    config: SyncConfig,
    /// Statistics
    stats: SyncStats,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// Fails when a definition is inconsistent or names an unknown parent.
    pub fn new(
        fetcher: RecordFetcher,
        streams: Vec<StreamDefinition>,
        state: StateManager,
    ) -> Result<Self> {
        for stream in &streams {
            stream.validate()?;
            if let Some(parent) = &stream.parent {
                if !streams.iter().any(|s| &s.name == parent) {
                    return Err(Error::catalog(format!(
                        "stream '{}' has unknown parent '{parent}'",
                        stream.name
                    )));
                }
            }
        }

        Ok(Self {
            fetcher,
            streams,
            state,
            config: SyncConfig::default(),
            stats: SyncStats::default(),
        })
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Stream definitions
    pub fn streams(&self) -> &[StreamDefinition] {
        &self.streams
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Discovery catalog
    pub fn catalog(&self) -> Value {
        catalog(&self.streams)
    }

    /// Run the full traversal, writing every message to `sink`
    pub async fn sync(&mut self, sink: &mut dyn MessageSink) -> Result<SyncStats> {
        let start = Instant::now();
        let (emit, active) = self.selection()?;

        if self.config.emit_schemas {
            for stream in self.streams.iter().filter(|s| emit.contains(&s.name)) {
                sink.write(&Message::schema(
                    &stream.name,
                    stream.schema.to_json(),
                    stream.primary_keys.clone(),
                    stream.replication_key.iter().cloned().collect(),
                ))?;
            }
        }

        let mut run = Traversal {
            fetcher: &self.fetcher,
            streams: &self.streams,
            emit: &emit,
            active: &active,
            state: &mut self.state,
            stats: &mut self.stats,
            sink,
        };

        for root in self.streams.iter().filter(|s| s.parent.is_none()) {
            if active.contains(&root.name) {
                info!(stream = %root.name, "Starting sync");
                run.sync_stream(root, Context::new()).await?;
            }
        }

        run.sink.write(&Message::state(run.state.to_value()))?;
        run.sink.flush()?;

        self.stats.pages_fetched = self.fetcher.pages_fetched();
        self.stats.tolerated_responses = self.fetcher.tolerated_responses();
        self.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            records = self.stats.total_records(),
            pages = self.stats.pages_fetched,
            duration_ms = self.stats.duration_ms,
            "Sync complete"
        );
        Ok(self.stats.clone())
    }

    /// Streams to emit, and streams to traverse (emitted plus their ancestors)
    fn selection(&self) -> Result<(BTreeSet<String>, BTreeSet<String>)> {
        let emit: BTreeSet<String> = match &self.config.selected_streams {
            None => self.streams.iter().map(|s| s.name.clone()).collect(),
            Some(selected) => {
                for name in selected {
                    if !self.streams.iter().any(|s| &s.name == name) {
                        return Err(Error::StreamNotFound {
                            stream: name.clone(),
                        });
                    }
                }
                selected.iter().cloned().collect()
            }
        };

        let mut active = emit.clone();
        for name in &emit {
            let mut parent = self.find(name).and_then(|s| s.parent.as_deref());
            while let Some(p) = parent {
                if !active.insert(p.to_string()) {
                    break;
                }
                parent = self.find(p).and_then(|s| s.parent.as_deref());
            }
        }
        Ok((emit, active))
    }

    fn find(&self, name: &str) -> Option<&StreamDefinition> {
        self.streams.iter().find(|s| s.name == name)
    }
}

/// Discovery catalog for a set of streams
pub fn catalog(streams: &[StreamDefinition]) -> Value {
    json!({
        "streams": streams.iter().map(StreamDefinition::catalog_entry).collect::<Vec<_>>()
    })
}

/// Borrowed state of one sync run
struct Traversal<'a> {
    fetcher: &'a RecordFetcher,
    streams: &'a [StreamDefinition],
    emit: &'a BTreeSet<String>,
    active: &'a BTreeSet<String>,
    state: &'a mut StateManager,
    stats: &'a mut SyncStats,
    sink: &'a mut dyn MessageSink,
}

impl<'a> Traversal<'a> {
    /// Fetch one stream in one context and recurse into its children
    fn sync_stream<'b>(
        &'b mut self,
        stream: &'a StreamDefinition,
        context: Context,
    ) -> BoxFuture<'b, Result<()>>
    where
        'a: 'b,
    {
        async move {
            let incremental = stream.is_incremental();
            if incremental {
                if let Some(bookmark) = self.state.starting_value(&stream.name, &context) {
                    info!(
                        stream = %stream.name,
                        context = %context,
                        bookmark,
                        "Skipping partition with existing bookmark"
                    );
                    self.stats.add_skipped_partition();
                    return Ok(());
                }
            }

            debug!(stream = %stream.name, context = %context, "Syncing partition");
            self.stats.add_partition();

            let streams = self.streams;
            let children: Vec<&'a StreamDefinition> = streams
                .iter()
                .filter(|s| s.parent.as_deref() == Some(stream.name.as_str()))
                .filter(|s| self.active.contains(&s.name))
                .collect();
            let emit = self.emit.contains(&stream.name);
            let mut max_key: Option<String> = None;

            let fetcher = self.fetcher;
            let records = fetcher.records(stream, &context);
            futures::pin_mut!(records);

            while let Some(record) = records.try_next().await? {
                if let Some(key) = stream.replication_key.as_deref().filter(|_| incremental) {
                    let value = record
                        .get(key)
                        .and_then(scalar_to_string)
                        .ok_or_else(|| Error::missing_record_field(&stream.name, key))?;
                    if max_key.as_deref().map_or(true, |current| value.as_str() > current) {
                        max_key = Some(value);
                    }
                }

                let child_context = match stream.child_context {
                    Some(derive) if !children.is_empty() => Some(derive(&record, &context)?),
                    _ => None,
                };

                if emit {
                    self.sink.write(&Message::record(&stream.name, record))?;
                    self.stats.add_record(&stream.name);
                }

                if let Some(child_context) = child_context {
                    for child in children.iter().copied() {
                        self.sync_stream(child, child_context.clone()).await?;
                    }
                }
            }

            if incremental {
                if let (Some(key), Some(value)) = (stream.replication_key.as_deref(), max_key) {
                    self.state.advance(&stream.name, &context, key, &value);
                }
                self.sink.write(&Message::state(self.state.to_value()))?;
            }
            Ok(())
        }
        .boxed()
    }
}
