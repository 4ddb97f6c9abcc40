//! Tests for StateManager

use super::*;
use crate::context::Context;
use serde_json::json;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn test_in_memory_starts_empty() {
    let manager = StateManager::in_memory();
    assert_eq!(manager.to_value(), json!({"bookmarks": {}}));
}

#[test]
fn test_advance_partition_bookmark() {
    let mut manager = StateManager::in_memory();
    let ctx = Context::new().with("sha", "abc");

    assert!(manager.advance("commit_files", &ctx, "rowId", "r1|main|abc|a.py"));
    assert!(manager.advance("commit_files", &ctx, "rowId", "r1|main|abc|b.py"));
    assert_eq!(
        manager.starting_value("commit_files", &ctx),
        Some("r1|main|abc|b.py")
    );
}

#[test]
fn test_advance_never_moves_backwards() {
    let mut manager = StateManager::in_memory();
    let ctx = Context::new().with("sha", "abc");

    manager.advance("commit_files", &ctx, "rowId", "b");
    assert!(!manager.advance("commit_files", &ctx, "rowId", "a"));
    assert!(!manager.advance("commit_files", &ctx, "rowId", "b"));
    assert_eq!(manager.starting_value("commit_files", &ctx), Some("b"));
}

#[test]
fn test_advance_unpartitioned_bookmark() {
    let mut manager = StateManager::in_memory();
    manager.advance("commits", &Context::new(), "timestamp", "2024-01-01T00:00:00Z");

    assert_eq!(
        manager.to_value(),
        json!({"bookmarks": {"commits": {
            "replication_key": "timestamp",
            "replication_key_value": "2024-01-01T00:00:00Z"
        }}})
    );
}

#[test]
fn test_from_json() {
    let manager = StateManager::from_json(
        r#"{"bookmarks": {"commit_files": {"partitions": [
            {"context": {"sha": "abc"}, "replication_key": "rowId", "replication_key_value": "k"}
        ]}}}"#,
    )
    .unwrap();

    assert_eq!(
        manager.starting_value("commit_files", &Context::new().with("sha", "abc")),
        Some("k")
    );
}

#[test]
fn test_from_json_empty_and_invalid() {
    assert!(StateManager::from_json("").unwrap().state().bookmarks.is_empty());
    assert!(StateManager::from_json("{}").unwrap().state().bookmarks.is_empty());

    let err = StateManager::from_json("not json").unwrap_err();
    assert!(err.to_string().contains("Failed to parse state JSON"));
}

#[test]
fn test_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"bookmarks": {{"commits": {{"replication_key_value": "x"}}}}}}"#
    )
    .unwrap();

    let manager = StateManager::from_file(file.path()).unwrap();
    assert_eq!(manager.starting_value("commits", &Context::new()), Some("x"));
}

#[test]
fn test_from_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let manager = StateManager::from_file(dir.path().join("missing.json")).unwrap();
    assert!(manager.state().bookmarks.is_empty());
}

#[test]
fn test_to_json_round_trips() {
    let mut manager = StateManager::in_memory();
    manager.advance("commit_files", &Context::new().with("sha", "abc"), "rowId", "k");

    let restored = StateManager::from_json(&manager.to_json().unwrap()).unwrap();
    assert_eq!(restored.state(), manager.state());
}
