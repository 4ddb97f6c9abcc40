//! Common types used throughout tap-codecov
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Ordered query parameters (later entries win on duplicate keys)
pub type QueryParams = Vec<(String, String)>;

// ============================================================================
// Replication Method
// ============================================================================

/// How a stream's progress is tracked between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationMethod {
    /// Every run re-extracts the full table
    #[default]
    FullTable,
    /// Runs resume from a replication-key bookmark
    Incremental,
}

impl fmt::Display for ReplicationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullTable => write!(f, "FULL_TABLE"),
            Self::Incremental => write!(f, "INCREMENTAL"),
        }
    }
}

// ============================================================================
// Git Hosting Service
// ============================================================================

/// Git hosting provider a Codecov owner lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    #[default]
    Github,
    GithubEnterprise,
    Gitlab,
    GitlabEnterprise,
    Bitbucket,
    BitbucketServer,
}

impl Service {
    /// All known services, in the order they are documented
    pub const ALL: [Service; 6] = [
        Service::Github,
        Service::GithubEnterprise,
        Service::Gitlab,
        Service::GitlabEnterprise,
        Service::Bitbucket,
        Service::BitbucketServer,
    ];

    /// URL path segment for this service
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Github => "github",
            Service::GithubEnterprise => "github_enterprise",
            Service::Gitlab => "gitlab",
            Service::GitlabEnterprise => "gitlab_enterprise",
            Service::Bitbucket => "bitbucket",
            Service::BitbucketServer => "bitbucket_server",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Service::ALL
            .into_iter()
            .find(|service| service.as_str() == s)
            .ok_or_else(|| format!("unknown service '{s}'"))
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

/// Render a scalar JSON value as a plain string
///
/// Strings are returned without quotes; objects, arrays and null yield `None`.
pub fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replication_method_serde() {
        let method: ReplicationMethod = serde_json::from_str("\"INCREMENTAL\"").unwrap();
        assert_eq!(method, ReplicationMethod::Incremental);

        let json = serde_json::to_string(&ReplicationMethod::FullTable).unwrap();
        assert_eq!(json, "\"FULL_TABLE\"");
        assert_eq!(ReplicationMethod::Incremental.to_string(), "INCREMENTAL");
    }

    #[test]
    fn test_service_round_trips_through_str() {
        for service in Service::ALL {
            assert_eq!(service.as_str().parse::<Service>().unwrap(), service);
        }
        assert!("sourceforge".parse::<Service>().is_err());
        assert_eq!(Service::default(), Service::Github);
    }

    #[test]
    fn test_service_serde() {
        let service: Service = serde_json::from_str("\"bitbucket_server\"").unwrap();
        assert_eq!(service, Service::BitbucketServer);
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("test".to_string()).none_if_empty(),
            Some("test".to_string())
        );
        assert_eq!(Some(String::new()).none_if_empty(), None);
    }

    #[test]
    fn test_scalar_to_string() {
        assert_eq!(scalar_to_string(&json!("main")), Some("main".to_string()));
        assert_eq!(scalar_to_string(&json!(42)), Some("42".to_string()));
        assert_eq!(scalar_to_string(&json!(true)), Some("true".to_string()));
        assert_eq!(scalar_to_string(&json!(null)), None);
        assert_eq!(scalar_to_string(&json!({"a": 1})), None);
    }
}
