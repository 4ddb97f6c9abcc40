//! Output module
//!
//! Writes engine messages as JSON lines.
//!
//! # Overview
//!
//! This module provides:
//! - [`MessageSink`] - destination for SCHEMA / RECORD / STATE messages
//! - [`JsonLinesWriter`] - one JSON document per line on any `Write`
//! - [`MemorySink`] - collects messages in memory

mod writer;

pub use writer::{JsonLinesWriter, MemorySink, MessageSink};
