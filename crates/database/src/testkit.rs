//! Fixtures for tests that need a real SQLite file behind a blob URL.

pub use api_client::testkit::BlobServer;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::Executor;
use std::path::Path;

/// Container name used by the public assessment data.
pub const CONTAINER: &str = "aiap18-assessment-data";

const SAMPLE_SCHEMA: &str = r#"
CREATE TABLE calls (
    id INTEGER PRIMARY KEY,
    month INTEGER NOT NULL,
    hour INTEGER NOT NULL,
    duration REAL,
    outcome TEXT NOT NULL
);
INSERT INTO calls (id, month, hour, duration, outcome) VALUES
    (1, 1, 9, 3.5, 'answered'),
    (2, 4, 13, NULL, 'missed'),
    (3, 7, 18, 12.25, 'answered'),
    (4, 12, 23, 0.5, 'voicemail');
"#;

/// Writes a small `calls` database to `path`, replacing any existing file.
pub async fn write_sample_database(path: &Path) -> Result<(), sqlx::Error> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let options = SqliteConnectOptions::new()
        .filename(path)
        .journal_mode(SqliteJournalMode::Delete)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    pool.execute(SAMPLE_SCHEMA).await?;
    pool.close().await;
    Ok(())
}

/// Builds the sample database inside `scratch` and returns its bytes.
pub async fn sample_database_bytes(scratch: &Path) -> Result<Vec<u8>, sqlx::Error> {
    let path = scratch.join("sample-source.db");
    write_sample_database(&path).await?;
    Ok(std::fs::read(&path)?)
}

/// Starts a `BlobServer` already holding the sample database as `db_name`.
pub async fn serve_sample_database(scratch: &Path, db_name: &str) -> Result<BlobServer, sqlx::Error> {
    let server = BlobServer::start(CONTAINER)?;
    server.insert(db_name, sample_database_bytes(scratch).await?);
    Ok(server)
}
