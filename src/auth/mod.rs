//! Authentication module
//!
//! Supports: Bearer token (Codecov API tokens), or no authentication
//!
//! The `Authenticator` attaches credentials to each outgoing request. Token
//! values are redacted from `Debug` output so they never reach the logs.

mod authenticator;

pub use authenticator::{AuthConfig, Authenticator};
