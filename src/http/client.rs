//! HTTP client with retry and rate limiting
//!
//! Provides the request/response cycle every stream shares:
//! - Bearer authentication and an optional user agent
//! - Request timeouts surfaced as [`Error::Timeout`]
//! - Status classification through a [`ResponsePolicy`]
//! - Automatic retries with configurable backoff for retriable outcomes
//! - Rate limiting to prevent API throttling

use super::policy::{ResponseClass, ResponsePolicy};
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::Authenticator;
use crate::error::{Error, Result};
use crate::types::{BackoffType, QueryParams};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            max_retries: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            rate_limit: None,
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// A validated response
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Successful response with a parsed JSON body
    Json(Value),
    /// The status was tolerated; there is no data
    Tolerated {
        /// The tolerated status code
        status: u16,
    },
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Authenticator,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            authenticator: Authenticator::default(),
            rate_limiter,
        })
    }

    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, authenticator: Authenticator) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.authenticator = authenticator;
        Ok(client)
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// GET a URL and validate the response against a policy
    ///
    /// Retriable outcomes are re-sent unchanged until `max_retries` is reached,
    /// after which the last failure is returned wrapped in
    /// [`Error::RetriesExhausted`].
    pub async fn get_json(
        &self,
        url: &str,
        query: &QueryParams,
        policy: &ResponsePolicy,
    ) -> Result<ApiResponse> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            match self.send_once(url, query, policy).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    let delay = self.calculate_backoff(attempt);
                    warn!(
                        "{e}; attempt {}/{}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_retryable() => {
                    return Err(Error::RetriesExhausted {
                        attempts: attempt + 1,
                        source: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Send one request and classify the response
    async fn send_once(
        &self,
        url: &str,
        query: &QueryParams,
        policy: &ResponsePolicy,
    ) -> Result<ApiResponse> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self.client.get(url);
        if !query.is_empty() {
            req = req.query(query);
        }
        req = self.authenticator.apply(req);

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_ms: self.config.timeout.as_millis() as u64,
                }
            } else {
                Error::Http(e)
            }
        })?;
        let status = response.status().as_u16();

        match policy.classify(status) {
            ResponseClass::Tolerated => {
                let (path, query, reason) = describe(&response);
                warn!(
                    "{status} Tolerated Status Code (Reason: {reason}) for path: {path} Query: {query}"
                );
                Ok(ApiResponse::Tolerated { status })
            }
            ResponseClass::Retriable => {
                let (path, query, reason) = describe(&response);
                Err(Error::RetriableApi {
                    status,
                    reason,
                    path,
                    query,
                })
            }
            ResponseClass::Fatal => {
                let (path, query, reason) = describe(&response);
                Err(Error::FatalApi {
                    status,
                    reason,
                    path,
                    query,
                })
            }
            ResponseClass::Success => {
                debug!("GET {} -> {status}", response.url());
                let body = response.text().await?;
                let json = serde_json::from_str(&body)
                    .map_err(|e| Error::decode(format!("Failed to parse JSON body: {e}")))?;
                Ok(ApiResponse::Json(json))
            }
        }
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Linear => self.config.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("authenticator", &self.authenticator)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Path, query and reason phrase of a response, for log and error messages
fn describe(response: &Response) -> (String, String, String) {
    let url = response.url();
    (
        url.path().to_string(),
        url.query().unwrap_or_default().to_string(),
        response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string(),
    )
}
