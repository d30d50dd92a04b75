use crate::error::DbError;
use crate::frame;
use api_client::{BlobStorageClient, DatasetSource};
use polars::prelude::DataFrame;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Executor;
use std::path::{Path, PathBuf};

/// A downloaded SQLite database and a live connection to it.
///
/// `open` fetches the file and connects; `close` consumes the handle, so a
/// closed database cannot be queried again. The local file is left in place.
#[derive(Debug)]
pub struct Database {
    path: PathBuf,
    pool: SqlitePool,
}

impl Database {
    /// Downloads `db_name` from the public assessment container into `db_dir`
    /// and opens it.
    pub async fn open(db_dir: impl AsRef<Path>, db_name: &str) -> Result<Self, DbError> {
        let source = Self::default_source().inspect_err(|e| {
            tracing::error!("Failed to create database engine: {}", e);
        })?;
        Self::open_with(&source, db_dir, db_name).await
    }

    /// The source [`Database::open`] downloads from.
    pub fn default_source() -> Result<BlobStorageClient, DbError> {
        Ok(BlobStorageClient::default_container()?)
    }

    /// Like [`Database::open`], fetching from `source`.
    pub async fn open_with<S>(source: &S, db_dir: impl AsRef<Path>, db_name: &str) -> Result<Self, DbError>
    where
        S: DatasetSource + ?Sized,
    {
        let db_dir = db_dir.as_ref();
        tracing::info!(
            "Initializing database in directory: {} with database name: {}",
            db_dir.display(),
            db_name
        );

        match Self::download_and_connect(source, db_dir, db_name).await {
            Ok(db) => {
                tracing::info!(engine = %db.engine_url(), "Database engine created successfully.");
                Ok(db)
            }
            Err(e) => {
                tracing::error!("Failed to create database engine: {}", e);
                Err(e)
            }
        }
    }

    async fn download_and_connect<S>(source: &S, db_dir: &Path, db_name: &str) -> Result<Self, DbError>
    where
        S: DatasetSource + ?Sized,
    {
        tokio::fs::create_dir_all(db_dir)
            .await
            .map_err(|source| DbError::Directory {
                path: db_dir.display().to_string(),
                source,
            })?;

        let path = db_dir.join(db_name);
        source.download_to(db_name, &path).await?;

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .journal_mode(SqliteJournalMode::Delete)
            .create_if_missing(false);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(DbError::ConnectionError)?;

        // SQLite opens any file lazily; touching the schema rejects files that
        // are not databases at open time.
        if let Err(e) = pool.execute("SELECT count(*) FROM sqlite_master").await {
            pool.close().await;
            return Err(DbError::ConnectionError(e));
        }

        Ok(Self { path, pool })
    }

    /// Local path of the downloaded file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Engine URL in `sqlite:///<path>` form.
    pub fn engine_url(&self) -> String {
        format!("sqlite:///{}", self.path.display())
    }

    /// Runs `query` and returns the complete result.
    ///
    /// Failures are logged and returned; a missing table surfaces as
    /// `DbError::QueryError` carrying SQLite's `no such table: ...` message.
    pub async fn query_to_dataframe(&self, query: &str) -> Result<DataFrame, DbError> {
        tracing::info!("Executing query: {}", query);

        match self.fetch_frame(query).await {
            Ok(df) => {
                tracing::info!("Query executed successfully.");
                tracing::info!(
                    "Data queried has {} rows and {} columns.",
                    df.height(),
                    df.width()
                );
                Ok(df)
            }
            Err(e) => {
                tracing::error!("Failed to execute query: {}", e);
                Err(e)
            }
        }
    }

    async fn fetch_frame(&self, query: &str) -> Result<DataFrame, DbError> {
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::QueryError)?;

        if rows.is_empty() {
            let described = (&self.pool)
                .describe(query)
                .await
                .map_err(DbError::QueryError)?;
            return frame::empty_frame(described.columns());
        }

        frame::rows_to_dataframe(&rows)
    }

    /// Closes the connection. The downloaded file stays on disk.
    pub async fn close(self) {
        tracing::info!("Closing database connection.");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_downloads_from_the_assessment_container() {
        let source = Database::default_source().unwrap();
        assert_eq!(
            source.url_for("calls.db"),
            "https://techassessment.blob.core.windows.net/aiap18-assessment-data/calls.db"
        );
    }

    #[tokio::test]
    async fn open_reports_an_uncreatable_directory_before_downloading() {
        let scratch = tempfile::tempdir().unwrap();
        let not_a_dir = scratch.path().join("occupied");
        std::fs::write(&not_a_dir, b"file").unwrap();

        let err = Database::open(&not_a_dir, "calls.db").await.unwrap_err();

        assert!(matches!(err, DbError::Directory { .. }));
        assert!(err.is_open_failure());
    }
}
