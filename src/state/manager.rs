//! State manager implementation
//!
//! Loads the starting state and records bookmark advances during a run.

use super::types::State;
use crate::context::Context;
use crate::error::{Error, Result};
use serde_json::Value;
use std::path::Path;

/// Owns the run's state and applies bookmark updates
#[derive(Debug, Clone, Default)]
pub struct StateManager {
    state: State,
}

impl StateManager {
    /// Create an empty in-memory state manager
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Wrap an existing state
    pub fn with_state(state: State) -> Self {
        Self { state }
    }

    /// Load state from a file; a missing file yields an empty state
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::in_memory());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
        Self::from_json(&contents)
    }

    /// Load state from inline JSON
    ///
    /// An empty string or `{}` yields an empty state.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::in_memory());
        }
        let state: State = serde_json::from_str(json)
            .map_err(|e| Error::state(format!("Failed to parse state JSON: {e}")))?;
        Ok(Self { state })
    }

    /// Current state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Starting bookmark for a stream and context
    pub fn starting_value(&self, stream: &str, context: &Context) -> Option<&str> {
        self.state.replication_key_value(stream, context)
    }

    /// Advance a bookmark if `value` sorts after the stored one
    ///
    /// Returns true when the bookmark changed.
    pub fn advance(
        &mut self,
        stream: &str,
        context: &Context,
        replication_key: &str,
        value: &str,
    ) -> bool {
        let stream_state = self.state.get_stream_mut(stream);
        let (key_slot, value_slot) = if context.is_empty() {
            (
                &mut stream_state.replication_key,
                &mut stream_state.replication_key_value,
            )
        } else {
            let partition = stream_state.get_partition_mut(context);
            (
                &mut partition.replication_key,
                &mut partition.replication_key_value,
            )
        };

        if value_slot.as_deref().is_some_and(|current| current >= value) {
            return false;
        }
        *key_slot = Some(replication_key.to_string());
        *value_slot = Some(value.to_string());
        true
    }

    /// Export state as a JSON value
    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.state).unwrap_or_default()
    }

    /// Export state as JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }
}
