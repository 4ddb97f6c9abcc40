// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! # tap-codecov
//!
//! Extracts repositories, commits and per-file coverage totals from the
//! Codecov API and emits them as a schema-tagged JSON-lines record stream.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_codecov::config::TapConfig;
//! use tap_codecov::engine::SyncEngine;
//! use tap_codecov::output::JsonLinesWriter;
//! use tap_codecov::state::StateManager;
//! use tap_codecov::stream::RecordFetcher;
//! use tap_codecov::streams::discover_streams;
//!
//! #[tokio::main]
//! async fn main() -> tap_codecov::Result<()> {
//!     let config = TapConfig::new("token", "my-org");
//!     let fetcher = RecordFetcher::new(config.http_client()?, config.base_url()?);
//!     let mut engine =
//!         SyncEngine::new(fetcher, discover_streams(&config), StateManager::in_memory())?;
//!
//!     let mut out = JsonLinesWriter::stdout();
//!     engine.sync(&mut out).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ SyncEngine: depth-first over repositories → commits → files   │
//! └───────────────────────────────┬───────────────────────────────┘
//!                                 │ StreamDefinition + Context
//! ┌───────────────────────────────┴───────────────────────────────┐
//! │ RecordFetcher: template → query merge → request → decode      │
//! └──────────┬───────────────┬────────────────┬───────────────────┘
//!            │               │                │
//!      ┌─────┴─────┐   ┌─────┴──────┐   ┌─────┴──────┐
//!      │ HttpClient│   │ HateoasPager│  │ JsonDecoder│
//!      │ retry/rate│   │ $.next      │  │ JSONPath   │
//!      └───────────┘   └────────────┘   └────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Tap configuration
pub mod config;

/// Authentication
pub mod auth;

/// Immutable request context
pub mod context;

/// Path template interpolation
pub mod template;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Response decoders
pub mod decode;

/// Record schemas
pub mod schema;

/// Stream definitions and the fetch loop
pub mod stream;

/// Codecov streams
pub mod streams;

/// Bookmark state
pub mod state;

/// Traversal engine
pub mod engine;

/// Message output
pub mod output;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use context::Context;
pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
