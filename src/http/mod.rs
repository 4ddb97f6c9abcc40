//! HTTP client module
//!
//! Provides the HTTP client with response classification, retry and
//! rate limiting.
//!
//! # Features
//!
//! - **Status Classification**: Tolerated / retriable / fatal / success per stream
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Authentication**: Bearer token via the auth module

mod client;
mod policy;
mod rate_limit;

pub use client::{ApiResponse, HttpClient, HttpClientConfig};
pub use policy::{ResponseClass, ResponsePolicy, MAX_KNOWN_STATUS};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
