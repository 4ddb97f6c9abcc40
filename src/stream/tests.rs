//! Tests for stream definitions and the fetch loop

use super::*;
use crate::context::Context;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use crate::pagination::{NoPager, PageCursor};
use crate::types::{BackoffType, JsonObject, ReplicationMethod};
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(server: &MockServer) -> RecordFetcher {
    let config = HttpClientConfig::builder()
        .max_retries(1)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(1),
            Duration::from_millis(1),
        )
        .build();
    let client = HttpClient::with_config(config).unwrap();
    RecordFetcher::new(client, format!("{}/api/v2/github/acme", server.uri()))
}

fn names(records: &[JsonObject]) -> Vec<&str> {
    records
        .iter()
        .filter_map(|r| r.get("name").and_then(Value::as_str))
        .collect()
}

fn drop_private(record: JsonObject, _ctx: &Context) -> crate::Result<Option<JsonObject>> {
    if record.get("private") == Some(&Value::Bool(true)) {
        Ok(None)
    } else {
        Ok(Some(record))
    }
}

// ============================================================================
// Definition
// ============================================================================

#[test]
fn test_definition_defaults() {
    let def = StreamDefinition::new("repositories", "/repos/");
    assert_eq!(def.parent, None);
    assert_eq!(def.replication_method, ReplicationMethod::FullTable);
    assert_eq!(def.decoder.record_path(), Some(DEFAULT_RECORDS_PATH));
    assert!(def.child_context.is_none());
    assert!(def.validate().is_ok());
}

#[test]
fn test_definitions_own_their_default_params() {
    let first = StreamDefinition::new("a", "/a/").default_param("page_size", "10");
    let second = StreamDefinition::new("b", "/b/");
    assert_eq!(first.default_params.len(), 1);
    assert!(second.default_params.is_empty());
}

#[test]
fn test_incremental_requires_replication_key() {
    let mut def = StreamDefinition::new("commit_files", "/totals/").incremental("rowId");
    assert!(def.validate().is_ok());

    def.replication_key = None;
    assert!(matches!(def.validate(), Err(Error::Catalog { .. })));
}

#[test]
fn test_root_stream_cannot_use_placeholders() {
    let def = StreamDefinition::new("commits", "/repos/{repository}/commits/");
    let err = def.validate().unwrap_err();
    assert!(err.to_string().contains("repository"));
    assert!(def.parent("repositories").validate().is_ok());
}

#[test]
fn test_catalog_entry() {
    let def = StreamDefinition::new("commits", "/repos/{repository}/commits/")
        .parent("repositories")
        .primary_keys(["repository", "branch", "commitid"]);

    let entry = def.catalog_entry();
    assert_eq!(entry["tap_stream_id"], json!("commits"));
    assert_eq!(entry["key_properties"], json!(["repository", "branch", "commitid"]));
    assert_eq!(entry["replication_method"], json!("FULL_TABLE"));
    assert_eq!(entry["replication_key"], Value::Null);
    assert_eq!(entry["parent_stream"], json!("repositories"));
}

// ============================================================================
// Request building
// ============================================================================

#[test]
fn test_query_merges_defaults_context_and_cursor() {
    let def = StreamDefinition::new("commits", "/repos/{repository}/commits/")
        .default_param("page_size", "1000")
        .default_param("branch", "ignored")
        .params_from_context(["branch", "sha"]);
    let ctx = Context::from_iter([("repository", "r1"), ("branch", "main")]);

    let query = RecordFetcher::query(&def, &ctx, None);
    assert_eq!(
        query,
        vec![
            ("page_size".to_string(), "1000".to_string()),
            ("branch".to_string(), "main".to_string()),
        ]
    );

    let cursor = PageCursor::from_link("https://x/repos/r1/commits/?branch=dev&page=2");
    let query = RecordFetcher::query(&def, &ctx, Some(&cursor));
    assert_eq!(
        query,
        vec![
            ("page_size".to_string(), "1000".to_string()),
            ("branch".to_string(), "dev".to_string()),
            ("page".to_string(), "2".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_url_renders_context() {
    let server = MockServer::start().await;
    let fetcher = fetcher(&server);
    let def = StreamDefinition::new("commits", "/repos/{repository}/commits/");

    let url = fetcher
        .url(&def, &Context::new().with("repository", "my repo"))
        .unwrap();
    assert_eq!(
        url,
        format!("{}/api/v2/github/acme/repos/my%20repo/commits/", server.uri())
    );

    let err = fetcher.url(&def, &Context::new()).unwrap_err();
    assert!(matches!(err, Error::UndefinedVariable { .. }));
}

// ============================================================================
// Fetch loop
// ============================================================================

#[tokio::test]
async fn test_pages_until_next_is_null() {
    let server = MockServer::start().await;
    let base = format!("{}/api/v2/github/acme/repos/", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/v2/github/acme/repos/"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": format!("{base}?page=2"),
            "results": [{"name": "a"}, {"name": "b"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/github/acme/repos/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": format!("{base}?page=3"),
            "results": [{"name": "c"}, {"name": "d"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/github/acme/repos/"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": null,
            "results": [{"name": "e"}, {"name": "f"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server);
    let def = StreamDefinition::new("repositories", "/repos/");
    let ctx = Context::new();
    let records: Vec<JsonObject> = fetcher.records(&def, &ctx).try_collect().await.unwrap();

    assert_eq!(names(&records), vec!["a", "b", "c", "d", "e", "f"]);
    assert_eq!(fetcher.pages_fetched(), 3);
}

#[tokio::test]
async fn test_tolerated_status_yields_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server);
    let def = StreamDefinition::new("commits", "/repos/{repository}/commits/").tolerate([404, 403]);
    let ctx = Context::new().with("repository", "gone");
    let records: Vec<JsonObject> = fetcher.records(&def, &ctx).try_collect().await.unwrap();

    assert!(records.is_empty());
    assert_eq!(fetcher.tolerated_responses(), 1);
}

#[tokio::test]
async fn test_untolerated_status_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = fetcher(&server);
    let def = StreamDefinition::new("repositories", "/repos/");
    let ctx = Context::new();
    let result: crate::Result<Vec<JsonObject>> = fetcher.records(&def, &ctx).try_collect().await;

    let err = result.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_repeated_next_link_is_a_loop() {
    let server = MockServer::start().await;
    let next = format!("{}/api/v2/github/acme/repos/?page=2", server.uri());
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": next,
            "results": [{"name": "a"}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server);
    let def = StreamDefinition::new("repositories", "/repos/");
    let ctx = Context::new();
    let result: crate::Result<Vec<JsonObject>> = fetcher.records(&def, &ctx).try_collect().await;

    assert!(matches!(result, Err(Error::PaginationLoop { .. })));
}

#[tokio::test]
async fn test_cursor_cycle_is_a_loop() {
    let server = MockServer::start().await;
    let link = |page: u32| format!("{}/api/v2/github/acme/repos/?page={page}", server.uri());
    Mock::given(method("GET"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": link(2),
            "results": [{"name": "a"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": link(3),
            "results": [{"name": "b"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": link(2),
            "results": [{"name": "c"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server);
    let def = StreamDefinition::new("repositories", "/repos/");
    let ctx = Context::new();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        fetcher.raw_records(&def, &ctx).try_collect::<Vec<JsonObject>>(),
    )
    .await
    .expect("fetch terminates");

    match result {
        Err(Error::PaginationLoop { stream, next }) => {
            assert_eq!(stream, "repositories");
            assert_eq!(next, link(2));
        }
        other => panic!("expected a pagination loop, got {other:?}"),
    }
    assert_eq!(fetcher.pages_fetched(), 3);
}

#[tokio::test]
async fn test_failed_request_is_not_counted_as_a_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server);
    let def = StreamDefinition::new("repositories", "/repos/");
    let result = fetcher.fetch_page(&def, &Context::new(), None).await;

    assert!(matches!(result, Err(Error::RetriesExhausted { attempts: 2, .. })));
    assert_eq!(fetcher.pages_fetched(), 0);
}

#[tokio::test]
async fn test_post_process_drops_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": null,
            "results": [
                {"name": "public", "private": false},
                {"name": "secret", "private": true}
            ]
        })))
        .mount(&server)
        .await;

    let fetcher = fetcher(&server);
    let def = StreamDefinition::new("repositories", "/repos/").post_process(drop_private);
    let ctx = Context::new();

    let processed: Vec<JsonObject> = fetcher.records(&def, &ctx).try_collect().await.unwrap();
    assert_eq!(names(&processed), vec!["public"]);

    let raw: Vec<JsonObject> = fetcher.raw_records(&def, &ctx).try_collect().await.unwrap();
    assert_eq!(raw.len(), 2);
}

#[tokio::test]
async fn test_custom_records_path_and_single_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/github/acme/repos/r1/totals/"))
        .and(query_param("sha", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"name": "fileA.py"}, {"name": "fileB.py"}],
            "next": "ignored"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server);
    let def = StreamDefinition::new("commit_files", "/repos/{repository}/totals/")
        .records_path("$.files[*]")
        .params_from_context(["sha"])
        .pager(NoPager);
    let ctx = Context::from_iter([("repository", "r1"), ("sha", "abc123")]);
    let records: Vec<JsonObject> = fetcher.records(&def, &ctx).try_collect().await.unwrap();

    assert_eq!(names(&records), vec!["fileA.py", "fileB.py"]);
}
