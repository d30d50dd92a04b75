use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Column '{0}' does not exist in the dataset")]
    ColumnNotFound(String),

    #[error("Column '{column}' has non-numeric type {dtype}")]
    NonNumeric { column: String, dtype: String },

    #[error("Cycle length must be a finite, non-zero number, got {0}")]
    InvalidCycle(f64),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
