//! Intermediate and final tables passed between stages.

use crate::preprocessing::error::PreprocessingError;
use indexmap::IndexMap;
use ndarray::{concatenate, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// A table without missing values, split by column role.
///
/// Produced by the imputation stage. Numeric columns hold finite reals,
/// categorical columns hold levels. Both maps keep schema order.
#[derive(Clone, Debug, PartialEq)]
pub struct ImputedTable {
    n_rows: usize,
    numeric: IndexMap<String, Vec<f64>>,
    categorical: IndexMap<String, Vec<String>>,
}

impl ImputedTable {
    /// Assemble a table from already complete columns.
    ///
    /// # Errors
    /// Returns [`PreprocessingError::InvalidShape`] if a column length differs from `n_rows`.
    pub fn new(
        n_rows: usize,
        numeric: IndexMap<String, Vec<f64>>,
        categorical: IndexMap<String, Vec<String>>,
    ) -> Result<Self, PreprocessingError> {
        let lengths = numeric
            .iter()
            .map(|(name, col)| (name, col.len()))
            .chain(categorical.iter().map(|(name, col)| (name, col.len())));
        for (name, len) in lengths {
            if len != n_rows {
                return Err(PreprocessingError::InvalidShape {
                    expected: format!("{} rows", n_rows),
                    got: format!("{} rows in column '{}'", len, name),
                });
            }
        }
        Ok(Self {
            n_rows,
            numeric,
            categorical,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Numeric columns in schema order.
    pub fn numeric(&self) -> &IndexMap<String, Vec<f64>> {
        &self.numeric
    }

    /// Categorical columns in schema order.
    pub fn categorical(&self) -> &IndexMap<String, Vec<String>> {
        &self.categorical
    }

    pub fn numeric_column(&self, name: &str) -> Option<&[f64]> {
        self.numeric.get(name).map(Vec::as_slice)
    }

    pub fn categorical_column(&self, name: &str) -> Option<&[String]> {
        self.categorical.get(name).map(Vec::as_slice)
    }

    /// Fail unless the numeric block holds exactly `expected`, in that order.
    pub(crate) fn check_numeric<S: AsRef<str>>(
        &self,
        expected: &[S],
    ) -> Result<(), PreprocessingError> {
        check_names(self.numeric.keys(), expected)
    }

    /// Fail unless the categorical block holds exactly `expected`, in that order.
    pub(crate) fn check_categorical<S: AsRef<str>>(
        &self,
        expected: &[S],
    ) -> Result<(), PreprocessingError> {
        check_names(self.categorical.keys(), expected)
    }

    /// Replace the numeric block, keeping the categorical one.
    pub(crate) fn with_numeric(self, numeric: IndexMap<String, Vec<f64>>) -> Self {
        Self { numeric, ..self }
    }
}

fn check_names<'a, S: AsRef<str>>(
    got: impl Iterator<Item = &'a String>,
    expected: &[S],
) -> Result<(), PreprocessingError> {
    let got: Vec<&str> = got.map(String::as_str).collect();
    let matches = got.len() == expected.len()
        && got.iter().zip(expected).all(|(g, e)| *g == e.as_ref());
    if !matches {
        return Err(PreprocessingError::SchemaMismatch {
            expected: format!(
                "{:?}",
                expected.iter().map(AsRef::as_ref).collect::<Vec<&str>>()
            ),
            got: format!("{:?}", got),
        });
    }
    Ok(())
}

/// Named numeric columns over a dense `rows x columns` matrix.
///
/// Row order is the input row order. Two matrices produced from the same
/// fitted state have the same column names in the same order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    /// Wrap a matrix with its column names.
    ///
    /// # Errors
    /// Returns [`PreprocessingError::InvalidShape`] if the name count differs from the column count.
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Result<Self, PreprocessingError> {
        if names.len() != values.ncols() {
            return Err(PreprocessingError::InvalidShape {
                expected: format!("{} column names", values.ncols()),
                got: format!("{} column names", names.len()),
            });
        }
        Ok(Self { names, values })
    }

    /// A matrix with `n_rows` rows and no columns.
    pub fn empty(n_rows: usize) -> Self {
        Self {
            names: Vec::new(),
            values: Array2::zeros((n_rows, 0)),
        }
    }

    /// Build a matrix from named columns of equal length.
    pub fn from_columns(
        n_rows: usize,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, PreprocessingError> {
        let mut values = Array2::zeros((n_rows, columns.len()));
        let mut names = Vec::with_capacity(columns.len());
        for (j, (name, column)) in columns.into_iter().enumerate() {
            if column.len() != n_rows {
                return Err(PreprocessingError::InvalidShape {
                    expected: format!("{} rows", n_rows),
                    got: format!("{} rows in column '{}'", column.len(), name),
                });
            }
            for (i, x) in column.into_iter().enumerate() {
                values[[i, j]] = x;
            }
            names.push(name);
        }
        Ok(Self { names, values })
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_columns(&self) -> usize {
        self.values.ncols()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// The dense values, ready for a classifier.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|j| self.values.column(j))
    }

    /// Append the columns of `other` to the right.
    ///
    /// # Errors
    /// - [`PreprocessingError::InvalidShape`] if row counts differ
    /// - [`PreprocessingError::Schema`] if a column name would repeat
    pub fn hstack(&self, other: &FeatureMatrix) -> Result<Self, PreprocessingError> {
        if self.n_rows() != other.n_rows() {
            return Err(PreprocessingError::InvalidShape {
                expected: format!("{} rows", self.n_rows()),
                got: format!("{} rows", other.n_rows()),
            });
        }
        if let Some(dup) = other.names.iter().find(|n| self.names.contains(n)) {
            return Err(PreprocessingError::Schema(format!(
                "duplicate output column '{}'",
                dup
            )));
        }

        let values = concatenate(Axis(1), &[self.values.view(), other.values.view()])
            .map_err(|e| PreprocessingError::InvalidShape {
                expected: format!("{:?}", self.values.shape()),
                got: e.to_string(),
            })?;
        let names = self.names.iter().chain(&other.names).cloned().collect();
        Ok(Self { names, values })
    }

    /// Build a new matrix holding only the given rows, in the given order.
    ///
    /// # Errors
    /// Returns [`PreprocessingError::InvalidShape`] if an index is out of bounds.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self, PreprocessingError> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_rows()) {
            return Err(PreprocessingError::InvalidShape {
                expected: format!("row index < {}", self.n_rows()),
                got: format!("row index {}", bad),
            });
        }
        Ok(Self {
            names: self.names.clone(),
            values: self.values.select(Axis(0), indices),
        })
    }
}
