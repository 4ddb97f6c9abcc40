//! Authenticator implementation

use reqwest::RequestBuilder;
use std::fmt;

/// Authentication configuration
#[derive(Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// Bearer token authentication (`Authorization: Bearer <token>`)
    Bearer {
        /// The bearer token
        token: String,
    },
}

impl AuthConfig {
    /// Create a bearer token config
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
        }
    }
}

/// Applies credentials to requests
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    /// Create a new authenticator
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Create a bearer token authenticator
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new(AuthConfig::bearer(token))
    }

    /// Apply authentication to a request
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config {
            AuthConfig::None => req,
            AuthConfig::Bearer { token } => req.bearer_auth(token),
        }
    }

    /// Check whether any credentials are configured
    pub fn is_configured(&self) -> bool {
        !matches!(self.config, AuthConfig::None)
    }
}
