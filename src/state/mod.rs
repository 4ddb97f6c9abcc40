//! State management module
//!
//! Handles replication-key bookmarks between runs.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - bookmarks per stream, optionally split by request context
//! - `StateManager` - loads the starting state and tracks bookmark advances
//!
//! The tap never persists state itself. It is handed the previous run's state
//! and reports the advanced state through STATE messages.

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{PartitionState, State, StreamState};

#[cfg(test)]
mod manager_tests;
