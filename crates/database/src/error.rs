use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to create database directory {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to download the database file: {0}")]
    Download(#[from] api_client::error::ApiError),

    #[error("Failed to connect to the database: {0}")]
    ConnectionError(#[source] sqlx::Error),

    #[error("Failed to execute query: {0}")]
    QueryError(#[source] sqlx::Error),

    #[error("Failed to build a DataFrame from the query result: {0}")]
    FrameError(#[from] polars::prelude::PolarsError),
}

impl DbError {
    /// True for failures while acquiring the database (download, directory,
    /// connection) as opposed to running a query on it. The binary uses this
    /// to report "Could not open the database".
    pub fn is_open_failure(&self) -> bool {
        matches!(
            self,
            DbError::Directory { .. } | DbError::Download(_) | DbError::ConnectionError(_)
        )
    }
}
