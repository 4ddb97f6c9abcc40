//! Tap configuration
//!
//! The inbound config is a JSON object passed with `--config` (a file) or
//! `--config-json` (inline). Only `auth_token` and `owner` have no default.

use crate::auth::Authenticator;
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig};
use crate::types::{BackoffType, OptionStringExt, Service};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default API host
pub const DEFAULT_API_URL: &str = "https://api.codecov.io";

/// Tap configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapConfig {
    /// API token sent as a bearer token
    pub auth_token: String,

    /// Git hosting service
    #[serde(default)]
    pub service: Service,

    /// Organisation or user to extract
    #[serde(default)]
    pub owner: Option<String>,

    /// User-Agent header override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// API host
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// `page_size` sent to commit and file endpoints
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay growth between retries
    #[serde(default)]
    pub backoff_type: BackoffType,

    /// First backoff delay in milliseconds
    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,

    /// Backoff cap in milliseconds
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional client-side rate limit
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_page_size() -> u32 {
    1000
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff_initial_ms() -> u64 {
    500
}

fn default_backoff_max_ms() -> u64 {
    60_000
}

fn default_timeout_secs() -> u64 {
    300
}

impl TapConfig {
    /// Create a config with defaults for everything but the credentials and owner
    pub fn new(auth_token: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            service: Service::default(),
            owner: Some(owner.into()),
            user_agent: None,
            api_url: default_api_url(),
            page_size: default_page_size(),
            max_retries: default_max_retries(),
            backoff_type: BackoffType::default(),
            backoff_initial_ms: default_backoff_initial_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            timeout_secs: default_timeout_secs(),
            requests_per_second: None,
        }
    }

    /// Load config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&contents)
    }

    /// Parse config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid config: {e}")))
    }

    /// Check the fields needed to talk to the API
    pub fn validate(&self) -> Result<()> {
        if self.auth_token.trim().is_empty() {
            return Err(Error::missing_field("auth_token"));
        }
        match self.owner.as_deref() {
            Some(owner) if !owner.trim().is_empty() => {}
            _ => return Err(Error::missing_field("owner")),
        }
        url::Url::parse(&self.api_url)
            .map_err(|e| Error::invalid_value("api_url", e.to_string()))?;
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be greater than 0"));
        }
        if self.requests_per_second == Some(0) {
            return Err(Error::invalid_value(
                "requests_per_second",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// API base URL: `{api_url}/api/v2/{service}/{owner}`
    pub fn base_url(&self) -> Result<String> {
        let owner = self
            .owner
            .as_deref()
            .filter(|o| !o.trim().is_empty())
            .ok_or_else(|| Error::missing_field("owner"))?;
        Ok(format!(
            "{}/api/v2/{}/{}",
            self.api_url.trim_end_matches('/'),
            self.service,
            urlencoding::encode(owner)
        ))
    }

    /// HTTP settings derived from this config
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .max_retries(self.max_retries)
            .backoff(
                self.backoff_type,
                Duration::from_millis(self.backoff_initial_ms),
                Duration::from_millis(self.backoff_max_ms),
            );
        if let Some(agent) = self.user_agent.clone().none_if_empty() {
            builder = builder.user_agent(agent);
        }
        if let Some(rps) = self.requests_per_second {
            builder = builder.rate_limit(RateLimiterConfig::per_second(rps));
        }
        builder.build()
    }

    /// Build an authenticated HTTP client
    pub fn http_client(&self) -> Result<HttpClient> {
        HttpClient::with_auth(
            self.http_client_config(),
            Authenticator::bearer(self.auth_token.clone()),
        )
    }

    /// JSON Schema describing the accepted config
    pub fn spec() -> Value {
        let services: Vec<&str> = Service::ALL.iter().map(Service::as_str).collect();
        json!({
            "type": "object",
            "properties": {
                "auth_token": {
                    "type": "string",
                    "secret": true,
                    "description": "The token to authenticate against the API service"
                },
                "service": {
                    "type": "string",
                    "enum": services,
                    "default": Service::default().as_str(),
                    "description": "Which service to use"
                },
                "owner": {
                    "type": "string",
                    "description": "Which owner to query (usually the organization name)"
                },
                "user_agent": {
                    "type": "string",
                    "description": "User-Agent header sent with every request"
                },
                "api_url": {
                    "type": "string",
                    "default": DEFAULT_API_URL,
                    "description": "API host"
                },
                "page_size": {"type": "integer", "default": default_page_size(), "minimum": 1},
                "max_retries": {"type": "integer", "default": default_max_retries()},
                "backoff_type": {
                    "type": "string",
                    "enum": ["constant", "linear", "exponential"],
                    "default": "exponential"
                },
                "backoff_initial_ms": {"type": "integer", "default": default_backoff_initial_ms()},
                "backoff_max_ms": {"type": "integer", "default": default_backoff_max_ms()},
                "timeout_secs": {"type": "integer", "default": default_timeout_secs()},
                "requests_per_second": {"type": "integer", "minimum": 1}
            },
            "required": ["auth_token"]
        })
    }
}

impl fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapConfig")
            .field("auth_token", &"[REDACTED]")
            .field("service", &self.service)
            .field("owner", &self.owner)
            .field("user_agent", &self.user_agent)
            .field("api_url", &self.api_url)
            .field("page_size", &self.page_size)
            .field("max_retries", &self.max_retries)
            .field("backoff_type", &self.backoff_type)
            .field("backoff_initial_ms", &self.backoff_initial_ms)
            .field("backoff_max_ms", &self.backoff_max_ms)
            .field("timeout_secs", &self.timeout_secs)
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}
