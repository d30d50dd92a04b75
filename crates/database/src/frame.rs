//! Converts SQLite rows into a Polars `DataFrame`.
//!
//! SQLite types values, not columns, so each column's dtype is chosen from the
//! storage classes actually present in it.

use crate::error::DbError;
use polars::prelude::*;
use sqlx::sqlite::{SqliteColumn, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::collections::{HashMap, HashSet};

/// A single SQLite value, by storage class.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// The dtype a column resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Null,
    Integer,
    Real,
    Text,
    Blob,
}

impl Kind {
    fn of(cell: &Cell) -> Self {
        match cell {
            Cell::Null => Kind::Null,
            Cell::Integer(_) => Kind::Integer,
            Cell::Real(_) => Kind::Real,
            Cell::Text(_) => Kind::Text,
            Cell::Blob(_) => Kind::Blob,
        }
    }

    /// Widest kind able to hold both. Mixed numerics become `Real`; any other
    /// mix falls back to `Text`.
    fn merge(self, other: Kind) -> Kind {
        match (self, other) {
            (Kind::Null, k) | (k, Kind::Null) => k,
            (a, b) if a == b => a,
            (Kind::Integer, Kind::Real) | (Kind::Real, Kind::Integer) => Kind::Real,
            _ => Kind::Text,
        }
    }

    /// Kind for a declared column type, used when there are no rows to inspect.
    fn declared(type_name: &str) -> Kind {
        match type_name.to_ascii_uppercase().as_str() {
            "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => Kind::Integer,
            "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => Kind::Real,
            "TEXT" | "VARCHAR" | "DATE" | "TIME" | "DATETIME" => Kind::Text,
            "BLOB" => Kind::Blob,
            _ => Kind::Null,
        }
    }

    fn dtype(self) -> DataType {
        match self {
            Kind::Null => DataType::Null,
            Kind::Integer => DataType::Int64,
            Kind::Real => DataType::Float64,
            Kind::Text => DataType::String,
            Kind::Blob => DataType::Binary,
        }
    }
}

fn read_cell(row: &SqliteRow, index: usize) -> Result<Cell, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Cell::Null);
    }
    let storage = raw.type_info().name().to_string();

    // Types are checked against the storage class above.
    let cell = match storage.as_str() {
        "INTEGER" | "BOOLEAN" => Cell::Integer(row.try_get_unchecked::<i64, _>(index)?),
        "REAL" | "NUMERIC" => Cell::Real(row.try_get_unchecked::<f64, _>(index)?),
        "BLOB" => Cell::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        _ => Cell::Text(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(cell)
}

fn build_series(name: &str, kind: Kind, cells: Vec<Cell>) -> Series {
    match kind {
        Kind::Null => Series::full_null(name, cells.len(), &DataType::Null),
        Kind::Integer => {
            let values: Vec<Option<i64>> = cells
                .into_iter()
                .map(|c| match c {
                    Cell::Integer(v) => Some(v),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        Kind::Real => {
            let values: Vec<Option<f64>> = cells
                .into_iter()
                .map(|c| match c {
                    Cell::Integer(v) => Some(v as f64),
                    Cell::Real(v) => Some(v),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        Kind::Text => {
            let values: Vec<Option<String>> = cells
                .into_iter()
                .map(|c| match c {
                    Cell::Null => None,
                    Cell::Integer(v) => Some(v.to_string()),
                    Cell::Real(v) => Some(v.to_string()),
                    Cell::Text(v) => Some(v),
                    Cell::Blob(v) => Some(String::from_utf8_lossy(&v).into_owned()),
                })
                .collect();
            Series::new(name, values)
        }
        Kind::Blob => {
            let values: BinaryChunked = cells
                .into_iter()
                .map(|c| match c {
                    Cell::Blob(v) => Some(v),
                    _ => None,
                })
                .collect();
            values.with_name(name).into_series()
        }
    }
}

/// Result column names made unique for `DataFrame::new`.
///
/// Repeats (e.g. `a.id, b.id` from a self-join) get `_duplicated_{n}`
/// appended, skipping any suffix that is already taken.
fn unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let names: Vec<&str> = names.into_iter().collect();
    let mut taken: HashSet<String> = names.iter().map(|n| n.to_string()).collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(names.len());
    let mut next_suffix: HashMap<&str, usize> = HashMap::new();

    names
        .iter()
        .map(|&name| {
            if seen.insert(name) {
                return name.to_string();
            }
            let counter = next_suffix.entry(name).or_insert(0);
            loop {
                let candidate = format!("{name}_duplicated_{counter}");
                *counter += 1;
                if taken.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}

/// Materialises `rows` column by column. `rows` must be non-empty; use
/// [`empty_frame`] for an empty result.
pub fn rows_to_dataframe(rows: &[SqliteRow]) -> Result<DataFrame, DbError> {
    let Some(first) = rows.first() else {
        return Ok(DataFrame::empty());
    };

    let names = unique_names(first.columns().iter().map(|c| c.name()));
    let mut series = Vec::with_capacity(first.len());
    for (index, name) in names.iter().enumerate() {
        let mut kind = Kind::Null;
        let mut cells = Vec::with_capacity(rows.len());
        for row in rows {
            let cell = read_cell(row, index).map_err(DbError::QueryError)?;
            kind = kind.merge(Kind::of(&cell));
            cells.push(cell);
        }
        series.push(build_series(name, kind, cells));
    }

    Ok(DataFrame::new(series)?)
}

/// A zero-row frame with one column per described result column.
pub fn empty_frame(columns: &[SqliteColumn]) -> Result<DataFrame, DbError> {
    let names = unique_names(columns.iter().map(|c| c.name()));
    let series = columns
        .iter()
        .zip(&names)
        .map(|(c, name)| Series::new_empty(name, &Kind::declared(c.type_info().name()).dtype()))
        .collect();
    Ok(DataFrame::new(series)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_names_get_duplicated_suffixes() {
        assert_eq!(unique_names(["id", "id", "x", "id"]), vec!["id", "id_duplicated_0", "x", "id_duplicated_1"]);
        assert_eq!(unique_names(["1", "1"]), vec!["1", "1_duplicated_0"]);
    }

    #[test]
    fn suffix_skips_names_already_in_the_result() {
        assert_eq!(
            unique_names(["id", "id", "id_duplicated_0"]),
            vec!["id", "id_duplicated_1", "id_duplicated_0"]
        );
    }

    #[test]
    fn merge_widens_numerics_and_falls_back_to_text() {
        assert_eq!(Kind::Null.merge(Kind::Integer), Kind::Integer);
        assert_eq!(Kind::Integer.merge(Kind::Integer), Kind::Integer);
        assert_eq!(Kind::Integer.merge(Kind::Real), Kind::Real);
        assert_eq!(Kind::Real.merge(Kind::Text), Kind::Text);
        assert_eq!(Kind::Blob.merge(Kind::Integer), Kind::Text);
        assert_eq!(Kind::Blob.merge(Kind::Null), Kind::Blob);
    }

    #[test]
    fn mixed_numeric_column_becomes_float() {
        let cells = vec![Cell::Integer(1), Cell::Null, Cell::Real(2.5)];
        let series = build_series("x", Kind::Real, cells);

        assert_eq!(series.dtype(), &DataType::Float64);
        assert_eq!(series.null_count(), 1);
        assert_eq!(series.f64().unwrap().get(0), Some(1.0));
    }

    #[test]
    fn text_column_renders_numbers() {
        let cells = vec![Cell::Text("a".into()), Cell::Integer(7)];
        let series = build_series("x", Kind::Text, cells);

        assert_eq!(series.dtype(), &DataType::String);
        assert_eq!(series.str().unwrap().get(1), Some("7"));
    }

    #[test]
    fn all_null_column_keeps_its_length() {
        let series = build_series("x", Kind::Null, vec![Cell::Null, Cell::Null]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.null_count(), 2);
    }

    #[test]
    fn declared_types_map_to_dtypes() {
        assert_eq!(Kind::declared("integer").dtype(), DataType::Int64);
        assert_eq!(Kind::declared("REAL").dtype(), DataType::Float64);
        assert_eq!(Kind::declared("TEXT").dtype(), DataType::String);
        assert_eq!(Kind::declared("NULL").dtype(), DataType::Null);
    }
}
