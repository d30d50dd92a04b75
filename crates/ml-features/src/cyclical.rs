use crate::error::FeatureError;
use polars::prelude::*;
use std::f64::consts::PI;

/// Anything that owns the table features are added to.
pub trait DatasetOwner {
    fn dataset_mut(&mut self) -> &mut DataFrame;
}

impl DatasetOwner for DataFrame {
    fn dataset_mut(&mut self) -> &mut DataFrame {
        self
    }
}

/// Encodes a periodic column (month, hour, weekday, ...) on the unit circle.
///
/// For every value `v` the returned pair holds `sin(2π·v/max_value)` and
/// `cos(2π·v/max_value)`, named `{column}_sin` and `{column}_cos`. Nulls stay
/// null. The source frame is not modified.
///
/// # Errors
///
/// A `max_value` of zero, NaN or infinity is rejected with
/// [`FeatureError::InvalidCycle`] instead of yielding NaN/inf columns. A
/// missing column gives `ColumnNotFound` and a non-numeric one `NonNumeric`.
pub fn cyclical_features(
    df: &DataFrame,
    column: &str,
    max_value: f64,
) -> Result<(Series, Series), FeatureError> {
    if max_value == 0.0 || !max_value.is_finite() {
        return Err(FeatureError::InvalidCycle(max_value));
    }

    let source = df
        .column(column)
        .map_err(|_| FeatureError::ColumnNotFound(column.to_string()))?;
    if !source.dtype().is_numeric() {
        return Err(FeatureError::NonNumeric {
            column: column.to_string(),
            dtype: source.dtype().to_string(),
        });
    }

    let values = source.cast(&DataType::Float64)?;
    let values = values.f64()?;
    let angle = |v: f64| 2.0 * PI * v / max_value;

    let sin: Float64Chunked = values
        .into_iter()
        .map(|v| v.map(|v| angle(v).sin()))
        .collect();
    let cos: Float64Chunked = values
        .into_iter()
        .map(|v| v.map(|v| angle(v).cos()))
        .collect();

    Ok((
        sin.with_name(&format!("{column}_sin")).into_series(),
        cos.with_name(&format!("{column}_cos")).into_series(),
    ))
}

/// In-place variant of [`cyclical_features`] on a `DataFrame`.
pub trait CyclicalFeaturesExt {
    /// Adds `{column}_sin` and `{column}_cos`, replacing existing columns of
    /// the same names.
    fn add_cyclical_features(&mut self, column: &str, max_value: f64) -> Result<&mut Self, FeatureError>;
}

impl CyclicalFeaturesExt for DataFrame {
    fn add_cyclical_features(&mut self, column: &str, max_value: f64) -> Result<&mut Self, FeatureError> {
        let (sin, cos) = cyclical_features(self, column, max_value)?;
        self.with_column(sin)?;
        self.with_column(cos)?;
        tracing::info!("Added cyclical features for {}", column);
        Ok(self)
    }
}

/// Adds the cyclical pair to the table held by `owner`.
pub fn add_cyclical_features<O: DatasetOwner + ?Sized>(
    owner: &mut O,
    column: &str,
    max_value: f64,
) -> Result<(), FeatureError> {
    owner.dataset_mut().add_cyclical_features(column, max_value)?;
    Ok(())
}
