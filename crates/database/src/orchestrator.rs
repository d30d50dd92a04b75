use crate::connection::Database;
use crate::error::DbError;
use api_client::DatasetSource;
use polars::prelude::DataFrame;
use std::path::Path;

/// Downloads `db_name` into `db_dir`, runs `query` against it and closes it
/// again.
///
/// The error kind is preserved: open failures come back as
/// `Directory`/`Download`/`ConnectionError`, query failures as `QueryError`.
pub async fn query_data_from_database(
    query: &str,
    db_dir: impl AsRef<Path>,
    db_name: &str,
) -> Result<DataFrame, DbError> {
    tracing::info!(
        "Querying data from database: {} at path: {}",
        db_name,
        db_dir.as_ref().display()
    );
    let db = Database::open(db_dir, db_name).await?;
    run_and_close(db, query).await
}

/// [`query_data_from_database`] against an explicit source.
pub async fn query_data_with_source<S>(
    source: &S,
    query: &str,
    db_dir: impl AsRef<Path>,
    db_name: &str,
) -> Result<DataFrame, DbError>
where
    S: DatasetSource + ?Sized,
{
    tracing::info!(
        "Querying data from database: {} at path: {}",
        db_name,
        db_dir.as_ref().display()
    );
    let db = Database::open_with(source, db_dir, db_name).await?;
    run_and_close(db, query).await
}

async fn run_and_close(db: Database, query: &str) -> Result<DataFrame, DbError> {
    let result = db.query_to_dataframe(query).await;
    // The handle is released whether or not the query succeeded.
    db.close().await;

    match &result {
        Ok(_) => tracing::info!("Data queried successfully."),
        Err(e) => tracing::error!("Failed to query data: {}", e),
    }
    result
}
