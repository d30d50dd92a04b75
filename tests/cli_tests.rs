use assert_cmd::Command;
use database::testkit::{BlobServer, serve_sample_database};
use predicates::prelude::*;
use std::path::Path;

/// The binary with logging and downloads confined to `scratch`.
fn pipeline(scratch: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pipeline").unwrap();
    cmd.current_dir(scratch)
        .env("PIPELINE_LOGGING__DIRECTORY", scratch.join("logs"))
        .env("PIPELINE_DATA_SOURCE__DB_DIR", scratch.join("data"))
        .env("NO_PROXY", "127.0.0.1")
        .env("no_proxy", "127.0.0.1")
        .env_remove("RUST_LOG");
    cmd
}

#[tokio::test]
async fn query_prints_shape_and_writes_log_file() {
    let scratch = tempfile::tempdir().unwrap();
    let server = serve_sample_database(scratch.path(), "calls.db").await.unwrap();

    pipeline(scratch.path())
        .args(["query", "--sql", "SELECT month, hour FROM calls", "--db-name", "calls.db"])
        .args(["--base-url", &server.base_url()])
        .args(["--cyclical", "month=12", "--cyclical", "hour=24"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Result shape: (4, 6)"))
        .stdout(predicate::str::contains("month_sin"));

    let log = std::fs::read_to_string(scratch.path().join("logs").join("app.log")).unwrap();
    assert!(log.contains("Executing query: SELECT month, hour FROM calls"));
    assert!(log.contains("Added cyclical features for hour"));
    assert!(scratch.path().join("data").join("calls.db").exists());
}

#[tokio::test]
async fn query_can_save_parquet() {
    let scratch = tempfile::tempdir().unwrap();
    let server = serve_sample_database(scratch.path(), "calls.db").await.unwrap();
    let output = scratch.path().join("calls.parquet");

    pipeline(scratch.path())
        .args(["query", "--sql", "SELECT * FROM calls", "--db-name", "calls.db"])
        .args(["--base-url", &server.base_url()])
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    assert!(std::fs::metadata(&output).unwrap().len() > 0);
}

#[test]
fn unreachable_source_terminates_with_failure() {
    let scratch = tempfile::tempdir().unwrap();

    pipeline(scratch.path())
        .args(["query", "--sql", "SELECT 1", "--db-name", "calls.db"])
        .args(["--base-url", &BlobServer::unreachable_url()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to create database engine"))
        .stderr(predicate::str::contains("Could not open the database"));
}

#[tokio::test]
async fn base_url_falls_back_to_configuration() {
    let scratch = tempfile::tempdir().unwrap();
    let server = serve_sample_database(scratch.path(), "calls.db").await.unwrap();

    pipeline(scratch.path())
        .args(["query", "--sql", "SELECT id FROM calls", "--db-name", "calls.db"])
        .env("PIPELINE_DATA_SOURCE__BASE_URL", server.base_url())
        .assert()
        .success()
        .stdout(predicate::str::contains("Result shape: (4, 1)"));

    assert_eq!(server.requests(), 1);
}

#[tokio::test]
async fn bad_sql_terminates_with_failure() {
    let scratch = tempfile::tempdir().unwrap();
    let server = serve_sample_database(scratch.path(), "calls.db").await.unwrap();

    pipeline(scratch.path())
        .args(["query", "--sql", "SELECT * FROM no_such_table", "--db-name", "calls.db"])
        .args(["--base-url", &server.base_url()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no such table: no_such_table"))
        .stderr(predicate::str::contains("Could not open the database").not());
}

#[test]
fn missing_database_name_is_reported() {
    let scratch = tempfile::tempdir().unwrap();

    pipeline(scratch.path())
        .args(["query", "--sql", "SELECT 1"])
        .env_remove("PIPELINE_DATA_SOURCE__DB_NAME")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No database name given"));
}
