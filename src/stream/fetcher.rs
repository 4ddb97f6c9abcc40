//! Fetch loop
//!
//! Builds each request from a stream definition and a context, sends it
//! through the shared [`HttpClient`], and follows page cursors until the
//! pager reports no further page.

use super::types::StreamDefinition;
use crate::context::Context;
use crate::decode::RecordDecoder;
use crate::error::{Error, Result};
use crate::http::{ApiResponse, HttpClient};
use crate::pagination::PageCursor;
use crate::template;
use crate::types::{JsonObject, QueryParams};
use futures::stream::{Stream, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// One fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Raw records extracted from the body
    pub records: Vec<JsonObject>,
    /// Cursor for the following page
    pub next: Option<PageCursor>,
    /// Set when the response status was tolerated
    pub tolerated: Option<u16>,
}

enum Cursor {
    Start,
    Next(PageCursor),
    Done,
}

/// Runs the request/response cycle for any stream
#[derive(Debug)]
pub struct RecordFetcher {
    client: HttpClient,
    base_url: String,
    pages: AtomicUsize,
    tolerated: AtomicUsize,
}

impl RecordFetcher {
    /// Create a fetcher for `base_url` (e.g. `https://api.codecov.io/api/v2/github/acme`)
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            pages: AtomicUsize::new(0),
            tolerated: AtomicUsize::new(0),
        }
    }

    /// The API base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Pages answered with data or a tolerated status
    pub fn pages_fetched(&self) -> usize {
        self.pages.load(Ordering::Relaxed)
    }

    /// Tolerated responses seen so far
    pub fn tolerated_responses(&self) -> usize {
        self.tolerated.load(Ordering::Relaxed)
    }

    /// Full URL for a stream in a context
    pub fn url(&self, stream: &StreamDefinition, context: &Context) -> Result<String> {
        let path = template::render(&stream.path, context)?;
        Ok(format!("{}{path}", self.base_url))
    }

    /// Query parameters for one request
    ///
    /// Default parameters, then context-forwarded parameters, then the
    /// cursor's parameters; a later source replaces every earlier entry with
    /// the same name.
    pub fn query(
        stream: &StreamDefinition,
        context: &Context,
        cursor: Option<&PageCursor>,
    ) -> QueryParams {
        let mut query = stream.default_params.clone();

        let forwarded: QueryParams = stream
            .params_from_context
            .iter()
            .filter_map(|key| context.get(key).map(|v| (key.clone(), v.to_string())))
            .collect();
        merge_params(&mut query, forwarded);

        if let Some(cursor) = cursor {
            merge_params(&mut query, cursor.query().clone());
        }
        query
    }

    /// Fetch a single page
    pub async fn fetch_page(
        &self,
        stream: &StreamDefinition,
        context: &Context,
        cursor: Option<&PageCursor>,
    ) -> Result<Page> {
        let url = self.url(stream, context)?;
        let query = Self::query(stream, context, cursor);

        let response = self.client.get_json(&url, &query, &stream.policy).await?;
        self.pages.fetch_add(1, Ordering::Relaxed);
        match response {
            ApiResponse::Tolerated { status } => {
                self.tolerated.fetch_add(1, Ordering::Relaxed);
                Ok(Page {
                    records: Vec::new(),
                    next: None,
                    tolerated: Some(status),
                })
            }
            ApiResponse::Json(body) => {
                let records = stream.decoder.decode(&body)?;
                let next = stream.pager.next_cursor(&body);
                debug!(
                    stream = %stream.name,
                    records = records.len(),
                    has_next = next.is_some(),
                    "Fetched page"
                );
                Ok(Page {
                    records,
                    next,
                    tolerated: None,
                })
            }
        }
    }

    /// Lazily fetch every raw record for a stream in a context
    ///
    /// Each page is requested only when the previous one has been consumed.
    /// A tolerated status ends the sequence. A `next` value already requested
    /// during this fetch fails with [`Error::PaginationLoop`].
    pub fn raw_records<'a>(
        &'a self,
        stream: &'a StreamDefinition,
        context: &'a Context,
    ) -> impl Stream<Item = Result<JsonObject>> + Send + 'a {
        let start = (Cursor::Start, HashSet::<String>::new());
        futures::stream::try_unfold(start, move |(cursor, mut seen)| async move {
            let current = match cursor {
                Cursor::Done => return Ok(None),
                Cursor::Start => None,
                Cursor::Next(c) => Some(c),
            };
            if let Some(current) = &current {
                seen.insert(current.raw().to_string());
            }

            let page = self.fetch_page(stream, context, current.as_ref()).await?;

            let following = match page.next {
                Some(next) if seen.contains(next.raw()) => {
                    return Err(Error::PaginationLoop {
                        stream: stream.name.clone(),
                        next: next.raw().to_string(),
                    });
                }
                Some(next) => Cursor::Next(next),
                None => Cursor::Done,
            };

            Ok::<_, Error>(Some((page.records, (following, seen))))
        })
        .map_ok(|records| futures::stream::iter(records.into_iter().map(Ok::<_, Error>)))
        .try_flatten()
    }

    /// Lazily fetch records with the stream's post-processor applied
    ///
    /// Records the post-processor drops are skipped.
    pub fn records<'a>(
        &'a self,
        stream: &'a StreamDefinition,
        context: &'a Context,
    ) -> impl Stream<Item = Result<JsonObject>> + Send + 'a {
        self.raw_records(stream, context)
            .try_filter_map(move |record| {
                futures::future::ready((stream.post_process)(record, context))
            })
            .boxed()
    }
}

/// Append `incoming`, first removing existing entries for the same names
fn merge_params(query: &mut QueryParams, incoming: QueryParams) {
    query.retain(|(key, _)| !incoming.iter().any(|(k, _)| k == key));
    query.extend(incoming);
}
