//! Pagination strategy implementations

use super::types::{PageCursor, Pager};
use crate::decode::select_scalar;
use serde_json::Value;

// ============================================================================
// HATEOAS Pagination
// ============================================================================

/// Next link in the response body
///
/// Codecov list endpoints answer with
/// `{ "count": 3, "next": "https://.../repos/?page=2", "previous": null, "results": [...] }`.
/// A missing, null or empty `next` ends pagination.
#[derive(Debug, Clone)]
pub struct HateoasPager {
    /// JSONPath to the next link
    pub path: String,
}

impl Default for HateoasPager {
    fn default() -> Self {
        Self::new("$.next")
    }
}

impl HateoasPager {
    /// Create a pager reading the next link from `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Pager for HateoasPager {
    fn next_cursor(&self, body: &Value) -> Option<PageCursor> {
        select_scalar(body, &self.path)
            .filter(|link| !link.is_empty())
            .map(|link| PageCursor::from_link(&link))
    }
}

// ============================================================================
// No Pagination
// ============================================================================

/// No pagination - single request
#[derive(Debug, Clone, Default)]
pub struct NoPager;

impl Pager for NoPager {
    fn next_cursor(&self, _body: &Value) -> Option<PageCursor> {
        None
    }
}
