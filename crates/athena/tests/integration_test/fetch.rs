//! Tests for result fetching: download, scratch-file cleanup, and chunked
//! assembly against the in-memory store.

use minerva_athena::fetch::fetch_result;
use minerva_athena::{
    identity_transform, DownloadError, ExecutionHandle, Fetched, MockResultStore, QueryError,
    DEFAULT_CHUNK_ROWS,
};

#[tokio::test]
async fn test_fetch_downloads_and_assembles() {
    let store = MockResultStore::new();
    store.put("results", "exec-1.csv", b"a,b\n1,2\n3,4\n".to_vec());

    let scratch = tempfile::tempdir().unwrap();
    let handle = ExecutionHandle::new("exec-1", "SELECT 1");

    let fetched = fetch_result(
        &store,
        &handle,
        "results",
        scratch.path(),
        DEFAULT_CHUNK_ROWS,
        &identity_transform(),
    )
    .await
    .unwrap();

    let table = match fetched {
        Fetched::Table(t) => t,
        Fetched::Missing => panic!("expected a table"),
    };
    assert_eq!(table.columns, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.get_value(1, "b"), Some("4"));

    // The scratch copy is gone once assembly finishes.
    assert!(!scratch.path().join("exec-1.csv").exists());
    assert_eq!(store.download_count(), 1);
}

#[tokio::test]
async fn test_scratch_removed_after_parse_failure() {
    let store = MockResultStore::new();
    store.put("results", "exec-1.csv", b"a,b\n1,2\n3\n".to_vec());

    let scratch = tempfile::tempdir().unwrap();
    let handle = ExecutionHandle::new("exec-1", "SELECT 1");

    let err = fetch_result(
        &store,
        &handle,
        "results",
        scratch.path(),
        DEFAULT_CHUNK_ROWS,
        &identity_transform(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, QueryError::Csv(_)));
    assert!(!scratch.path().join("exec-1.csv").exists());
}

#[tokio::test]
async fn test_missing_object_is_reported_not_raised() {
    let store = MockResultStore::new();
    let scratch = tempfile::tempdir().unwrap();
    let handle = ExecutionHandle::new("exec-gone", "SELECT 1");

    let fetched = fetch_result(
        &store,
        &handle,
        "results",
        scratch.path(),
        DEFAULT_CHUNK_ROWS,
        &identity_transform(),
    )
    .await
    .unwrap();

    assert!(matches!(fetched, Fetched::Missing));
}

#[tokio::test]
async fn test_service_error_propagates() {
    let store = MockResultStore::failing("access denied");
    let scratch = tempfile::tempdir().unwrap();
    let handle = ExecutionHandle::new("exec-1", "SELECT 1");

    let err = fetch_result(
        &store,
        &handle,
        "results",
        scratch.path(),
        DEFAULT_CHUNK_ROWS,
        &identity_transform(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        QueryError::Download(DownloadError::Service { ref message, .. })
            if message == "access denied"
    ));
}

#[tokio::test]
async fn test_null_cells_survive_fetch() {
    let store = MockResultStore::new();
    store.put("results", "exec-1.csv", b"name,age\nalice,\n,30\n".to_vec());

    let scratch = tempfile::tempdir().unwrap();
    let handle = ExecutionHandle::new("exec-1", "SELECT 1");

    let fetched = fetch_result(
        &store,
        &handle,
        "results",
        scratch.path(),
        DEFAULT_CHUNK_ROWS,
        &identity_transform(),
    )
    .await
    .unwrap();

    let table = match fetched {
        Fetched::Table(t) => t,
        Fetched::Missing => panic!("expected a table"),
    };
    assert_eq!(table.get_value(0, "name"), Some("alice"));
    assert_eq!(table.get_value(0, "age"), None);
    assert_eq!(table.get_value(1, "name"), None);
    assert_eq!(table.get_value(1, "age"), Some("30"));
}
