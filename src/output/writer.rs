//! Message sinks

use crate::engine::Message;
use crate::error::{Error, Result};
use crate::types::JsonObject;
use std::io::{self, Stdout, Write};

/// Destination for engine messages
pub trait MessageSink: Send {
    /// Write one message
    fn write(&mut self, message: &Message) -> Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes each message as one line of JSON
#[derive(Debug)]
pub struct JsonLinesWriter<W: Write + Send> {
    out: W,
    lines: usize,
}

impl JsonLinesWriter<Stdout> {
    /// Writer on standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesWriter<W> {
    /// Wrap a writer
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    /// Lines written so far
    pub fn lines_written(&self) -> usize {
        self.lines
    }

    /// Unwrap the inner writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> MessageSink for JsonLinesWriter<W> {
    fn write(&mut self, message: &Message) -> Result<()> {
        serde_json::to_writer(&mut self.out, message)
            .map_err(|e| Error::Other(format!("Failed to serialize message: {e}")))?;
        self.out.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Keeps every message in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Messages in the order they were written
    pub messages: Vec<Message>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written for one stream
    pub fn records(&self, stream: &str) -> Vec<&JsonObject> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Record { stream: s, record, .. } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Stream names of all records, in emission order
    pub fn record_streams(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|m| m.is_record())
            .filter_map(Message::stream)
            .collect()
    }

    /// State messages, in order
    pub fn states(&self) -> Vec<&serde_json::Value> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::State { value } => Some(value),
                _ => None,
            })
            .collect()
    }
}

impl MessageSink for MemorySink {
    fn write(&mut self, message: &Message) -> Result<()> {
        self.messages.push(message.clone());
        Ok(())
    }
}
