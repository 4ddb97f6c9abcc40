//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `spec` - Print the config schema
//! - `check` - Test connection to the API
//! - `discover` - Print the stream catalog
//! - `read` - Extract records as JSON lines

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
