//! Codecov stream definitions
//!
//! Three streams form a hierarchy:
//!
//! ```text
//! repositories  /repos/
//!   └─ commits  /repos/{repository}/commits/          ?branch=
//!        └─ commit_files  /repos/{repository}/totals/ ?branch=&sha=
//! ```

use crate::config::TapConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::schema::{JsonSchema, SchemaProperty};
use crate::stream::{composite_key, StreamDefinition};
use crate::types::{scalar_to_string, JsonObject, JsonValue};

/// Repositories stream name
pub const REPOSITORIES: &str = "repositories";
/// Commits stream name
pub const COMMITS: &str = "commits";
/// Commit files stream name
pub const COMMIT_FILES: &str = "commit_files";

/// Statuses meaning "this repository or commit has nothing for us"
const ABSENT: [u16; 2] = [404, 403];

/// All streams, parents before children
pub fn discover_streams(config: &TapConfig) -> Vec<StreamDefinition> {
    vec![
        repositories(),
        commits(config.page_size),
        commit_files(config.page_size),
    ]
}

/// Active repositories of the owner
pub fn repositories() -> StreamDefinition {
    StreamDefinition::new(REPOSITORIES, "/repos/")
        .primary_keys(["name"])
        .default_param("active", "true")
        .schema(repository_schema())
        .child_context(repository_child_context)
}

/// Commits on a repository's default branch
pub fn commits(page_size: u32) -> StreamDefinition {
    StreamDefinition::new(COMMITS, "/repos/{repository}/commits/")
        .parent(REPOSITORIES)
        .primary_keys(["repository", "branch", "commitid"])
        .default_param("page_size", page_size.to_string())
        .params_from_context(["branch"])
        .tolerate(ABSENT)
        .schema(commit_schema())
        .child_context(commit_child_context)
        .post_process(stamp_commit)
}

/// Per-file coverage totals of a commit
pub fn commit_files(page_size: u32) -> StreamDefinition {
    StreamDefinition::new(COMMIT_FILES, "/repos/{repository}/totals/")
        .parent(COMMITS)
        .primary_keys(["rowId"])
        .incremental("rowId")
        .records_path("$.files[*]")
        .default_param("page_size", page_size.to_string())
        .params_from_context(["branch", "sha"])
        .tolerate(ABSENT)
        .schema(commit_file_schema())
        .post_process(build_file_row)
}

// ============================================================================
// Context derivation
// ============================================================================

fn required_field(record: &JsonObject, stream: &str, field: &str) -> Result<String> {
    record
        .get(field)
        .and_then(scalar_to_string)
        .ok_or_else(|| Error::missing_record_field(stream, field))
}

fn repository_child_context(record: &JsonObject, _parent: &Context) -> Result<Context> {
    Ok(Context::new()
        .with("repository", required_field(record, REPOSITORIES, "name")?)
        .with("branch", required_field(record, REPOSITORIES, "branch")?))
}

fn commit_child_context(record: &JsonObject, parent: &Context) -> Result<Context> {
    Ok(parent.with("sha", required_field(record, COMMITS, "commitid")?))
}

// ============================================================================
// Post-processing
// ============================================================================

/// Copy context values onto the record unless the API already sent them
fn stamp(record: &mut JsonObject, context: &Context, keys: &[&str]) {
    for key in keys {
        if let Some(value) = context.get(key) {
            record
                .entry(*key)
                .or_insert_with(|| JsonValue::String(value.to_string()));
        }
    }
}

fn stamp_commit(mut record: JsonObject, context: &Context) -> Result<Option<JsonObject>> {
    stamp(&mut record, context, &["repository", "branch"]);
    Ok(Some(record))
}

fn build_file_row(mut record: JsonObject, context: &Context) -> Result<Option<JsonObject>> {
    let name = required_field(&record, COMMIT_FILES, "name")?;
    let row_id = composite_key([
        context.require("repository")?,
        context.require("branch")?,
        context.require("sha")?,
        name.as_str(),
    ]);
    record.insert("rowId".to_string(), JsonValue::String(row_id));
    stamp(&mut record, context, &["repository", "branch", "sha"]);
    Ok(Some(record))
}

// ============================================================================
// Schemas
// ============================================================================

fn author() -> SchemaProperty {
    SchemaProperty::object([
        ("service", SchemaProperty::string()),
        ("name", SchemaProperty::string()),
        ("username", SchemaProperty::string()),
    ])
}

fn totals() -> SchemaProperty {
    SchemaProperty::object([
        ("files", SchemaProperty::integer()),
        ("lines", SchemaProperty::integer()),
        ("hits", SchemaProperty::integer()),
        ("misses", SchemaProperty::integer()),
        ("partials", SchemaProperty::integer()),
        ("coverage", SchemaProperty::number()),
        ("branches", SchemaProperty::integer()),
        ("methods", SchemaProperty::integer()),
        ("messages", SchemaProperty::integer()),
        ("sessions", SchemaProperty::integer()),
        ("complexity", SchemaProperty::number()),
        ("complexity_total", SchemaProperty::number()),
        ("complexity_ratio", SchemaProperty::number()),
        ("diff", SchemaProperty::integer()),
    ])
}

fn repository_schema() -> JsonSchema {
    JsonSchema::new()
        .property("name", SchemaProperty::string())
        .property("private", SchemaProperty::boolean())
        .property("updatestamp", SchemaProperty::datetime())
        .property("author", author())
        .property("language", SchemaProperty::string())
        .property("branch", SchemaProperty::string())
        .property("active", SchemaProperty::boolean())
        .property("activated", SchemaProperty::boolean())
}

fn commit_schema() -> JsonSchema {
    JsonSchema::new()
        .property("repository", SchemaProperty::string())
        .property("branch", SchemaProperty::string())
        .property("commitid", SchemaProperty::string())
        .property("message", SchemaProperty::string())
        .property("timestamp", SchemaProperty::datetime())
        .property("ci_passed", SchemaProperty::boolean())
        .property("author", author())
        .property("totals", totals())
        .property("state", SchemaProperty::string())
}

fn commit_file_schema() -> JsonSchema {
    JsonSchema::new()
        .property("repository", SchemaProperty::string())
        .property("sha", SchemaProperty::string())
        .property("branch", SchemaProperty::string())
        .property("rowId", SchemaProperty::string())
        .property("name", SchemaProperty::string())
        .property("totals", totals())
}
