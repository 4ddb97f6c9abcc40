//! Pagination types and traits

use crate::types::QueryParams;
use serde_json::Value;

/// Continuation token for the next page
///
/// Holds the raw `next` value the API returned and the query parameters
/// decoded from it. Query parameters from a cursor override any other
/// parameter with the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    raw: String,
    query: QueryParams,
}

impl PageCursor {
    /// Build a cursor from a next-page link or bare query string
    ///
    /// Everything after the first `?` is decoded as
    /// `application/x-www-form-urlencoded`; a value without `?` is decoded whole.
    pub fn from_link(link: &str) -> Self {
        let query_str = link.split_once('?').map_or(link, |(_, q)| q);
        let query_str = query_str.split('#').next().unwrap_or_default();
        let query = url::form_urlencoded::parse(query_str.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Self {
            raw: link.to_string(),
            query,
        }
    }

    /// The value the API returned
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Query parameters carried by this cursor
    pub fn query(&self) -> &QueryParams {
        &self.query
    }
}

/// Page-boundary detection
pub trait Pager: Send + Sync {
    /// Inspect a response body and return the cursor for the next page, if any
    fn next_cursor(&self, body: &Value) -> Option<PageCursor>;
}
