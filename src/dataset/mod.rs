//! Raw tabular input and row partitioning.
//!
//! This module provides the column-oriented [`RawTable`] that the ingestion
//! collaborator hands to the pipeline, and the [`StratifiedSplitter`] that
//! partitions its rows into train and test sets.
//!
//! # Core Concepts
//!
//! - **Value**: A single cell: a number, a piece of text, or the explicit
//!   [`Value::Missing`] marker. Missing is never conflated with `0.0` or `""`.
//! - **Column**: A named vector of values, one per row.
//! - **RawTable**: An ordered set of equally long, uniquely named columns.
//!   Row order is meaningful: feature engineering relies on it.
//!
//! # Example
//!
//! ```rust
//! use tabprep::dataset::{Column, RawTable, Value};
//!
//! let table = RawTable::new(vec![
//!     Column::numeric("amount", vec![Some(10.0), None, Some(30.0)]),
//!     Column::text("currency", vec![Some("USD"), Some("EUR"), None]),
//! ])
//! .unwrap();
//!
//! assert_eq!(table.n_rows(), 3);
//! assert_eq!(table.column("amount").unwrap().values()[1], Value::Missing);
//! ```

use crate::preprocessing::error::PreprocessingError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

mod ingest;
pub mod split;

pub use self::split::{Split, StratifiedSplitter};

/// A single cell of a raw table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Explicit absent marker.
    Missing,
    /// A real number. `NaN` is treated as absent by every stage.
    Number(f64),
    /// Free text, either a categorical level or a number in textual form.
    Text(String),
}

impl Value {
    /// Whether the cell carries no observation.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(x) => x.is_nan(),
            Value::Text(_) => false,
        }
    }

    /// Interpret the cell as a finite real number, if possible.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(x) if x.is_finite() => Some(*x),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
            _ => None,
        }
    }

    /// Interpret the cell as a categorical level.
    ///
    /// Numbers are rendered in their shortest decimal form, so `0.0` becomes `"0"`.
    /// Negative zero is the same level as zero.
    pub fn as_level(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            Value::Number(x) if x.is_nan() => None,
            // -0.0 + 0.0 == +0.0
            Value::Number(x) => Some(format!("{}", x + 0.0)),
            Value::Text(s) => Some(s.clone()),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Number(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

/// A named column of raw values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    /// Create a column from raw values.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Create a column of numbers; `None` becomes [`Value::Missing`].
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, values.into_iter().map(Value::from).collect())
    }

    /// Create a column of text; `None` becomes [`Value::Missing`].
    pub fn text(name: impl Into<String>, values: Vec<Option<&str>>) -> Self {
        Self::new(name, values.into_iter().map(Value::from).collect())
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column values in row order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of absent entries.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }
}

/// Column-oriented raw table.
///
/// Invariants: all columns have the same length and column names are unique.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    columns: Vec<Column>,
    n_rows: usize,
}

impl RawTable {
    /// Build a table from columns.
    ///
    /// # Errors
    /// - [`PreprocessingError::InvalidShape`] if column lengths differ
    /// - [`PreprocessingError::Schema`] if a column name repeats
    pub fn new(columns: Vec<Column>) -> Result<Self, PreprocessingError> {
        let n_rows = columns.first().map(Column::len).unwrap_or(0);

        let mut seen = HashSet::new();
        for column in &columns {
            if column.len() != n_rows {
                return Err(PreprocessingError::InvalidShape {
                    expected: format!("{} rows", n_rows),
                    got: format!("{} rows in column '{}'", column.len(), column.name),
                });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(PreprocessingError::Schema(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        Ok(Self { columns, n_rows })
    }

    /// Build a table from a header and row-major records.
    pub fn from_rows(
        headers: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, PreprocessingError> {
        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); headers.len()];
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(PreprocessingError::InvalidShape {
                    expected: format!("{} fields", headers.len()),
                    got: format!("{} fields in row {}", row.len(), row_idx),
                });
            }
            for (col, value) in row.into_iter().enumerate() {
                columns[col].push(value);
            }
        }

        Self::new(
            headers
                .iter()
                .zip(columns)
                .map(|(name, values)| Column::new(*name, values))
                .collect(),
        )
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Build a new table holding only the given rows, in the given order.
    ///
    /// # Errors
    /// Returns [`PreprocessingError::InvalidShape`] if an index is out of bounds.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self, PreprocessingError> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_rows) {
            return Err(PreprocessingError::InvalidShape {
                expected: format!("row index < {}", self.n_rows),
                got: format!("row index {}", bad),
            });
        }

        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: indices.iter().map(|&i| c.values[i].clone()).collect(),
            })
            .collect();

        Ok(Self {
            columns,
            n_rows: indices.len(),
        })
    }

    /// Class labels of the target column, one per row.
    ///
    /// # Errors
    /// - [`PreprocessingError::Schema`] if the column is absent or has missing entries
    pub fn target_labels(&self, target: &str) -> Result<Vec<String>, PreprocessingError> {
        let column = self.column(target).ok_or_else(|| {
            PreprocessingError::Schema(format!("target column '{}' not found", target))
        })?;

        column
            .values
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.as_level().ok_or_else(|| {
                    PreprocessingError::Schema(format!(
                        "target column '{}' is missing a value at row {}",
                        target, row
                    ))
                })
            })
            .collect()
    }
}
