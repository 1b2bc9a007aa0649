//! Column role inference.
//!
//! The [`SchemaInspector`] looks at every column once and assigns it exactly
//! one [`ColumnRole`]. The resulting [`Schema`] keeps the input column order,
//! which fixes the order of every downstream output column.

use crate::dataset::{RawTable, Value};
use crate::preprocessing::error::PreprocessingError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Role of a column in the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    /// Real-valued feature: imputed with a numeric statistic, then standardized.
    Numeric,
    /// Discrete feature: imputed with a level, then one-hot encoded.
    Categorical,
    /// Classification target. Never used as a feature.
    Target,
}

/// Ordered mapping of column name to role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    roles: IndexMap<String, ColumnRole>,
}

impl Schema {
    /// Build a schema from explicit roles, in the given order.
    ///
    /// # Errors
    /// Returns [`PreprocessingError::Schema`] on duplicate names or more than one target.
    pub fn from_roles<I, S>(roles: I) -> Result<Self, PreprocessingError>
    where
        I: IntoIterator<Item = (S, ColumnRole)>,
        S: Into<String>,
    {
        let mut map = IndexMap::new();
        for (name, role) in roles {
            let name = name.into();
            if map.contains_key(&name) {
                return Err(PreprocessingError::Schema(format!(
                    "duplicate column name '{}'",
                    name
                )));
            }
            map.insert(name, role);
        }

        if map.values().filter(|r| **r == ColumnRole::Target).count() > 1 {
            return Err(PreprocessingError::Schema(
                "more than one target column".to_string(),
            ));
        }

        Ok(Self { roles: map })
    }

    /// Role of a column, if it is part of the schema.
    pub fn role(&self, name: &str) -> Option<ColumnRole> {
        self.roles.get(name).copied()
    }

    /// Iterate over `(name, role)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnRole)> {
        self.roles.iter().map(|(name, role)| (name.as_str(), *role))
    }

    /// Number of columns, including the target.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Whether the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Names of numeric feature columns, in order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns_with(ColumnRole::Numeric)
    }

    /// Names of categorical feature columns, in order.
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.columns_with(ColumnRole::Categorical)
    }

    /// Names of all feature columns (numeric and categorical), in order.
    pub fn feature_columns(&self) -> Vec<&str> {
        self.roles
            .iter()
            .filter(|(_, role)| **role != ColumnRole::Target)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Name of the target column, if any.
    pub fn target(&self) -> Option<&str> {
        self.columns_with(ColumnRole::Target).into_iter().next()
    }

    fn columns_with(&self, wanted: ColumnRole) -> Vec<&str> {
        self.roles
            .iter()
            .filter(|(_, role)| **role == wanted)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Check that a table carries exactly this schema's feature columns.
    ///
    /// The target column may be present or absent; any other unknown or
    /// missing column is a mismatch.
    pub fn check_table(&self, table: &RawTable) -> Result<(), PreprocessingError> {
        let expected = self.feature_columns();
        let target = self.target();
        let got: Vec<&str> = table
            .column_names()
            .into_iter()
            .filter(|name| Some(*name) != target)
            .collect();

        let missing = expected.iter().any(|name| !got.contains(name));
        let extra = got.iter().any(|name| !expected.contains(name));
        if missing || extra {
            return Err(PreprocessingError::SchemaMismatch {
                expected: format!("{:?}", expected),
                got: format!("{:?}", got),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
struct KindCounts {
    numbers: usize,
    other_text: usize,
}

/// Infers a [`Schema`] from a raw table.
#[derive(Clone, Debug, Default)]
pub struct SchemaInspector;

impl SchemaInspector {
    /// Create a new inspector.
    pub fn new() -> Self {
        Self
    }

    /// Classify every column of `table`.
    ///
    /// A column is numeric when every present value is a number or text that
    /// parses as a finite real. Columns without a single present value are
    /// classified numeric; fitting then rejects them as empty.
    ///
    /// # Errors
    /// Returns [`PreprocessingError::Schema`] if the named target is absent,
    /// a feature column holds an infinite number, or a column mixes numbers
    /// with non-numeric text.
    pub fn inspect(
        &self,
        table: &RawTable,
        target: Option<&str>,
    ) -> Result<Schema, PreprocessingError> {
        if let Some(target) = target {
            if table.column(target).is_none() {
                return Err(PreprocessingError::Schema(format!(
                    "target column '{}' not found",
                    target
                )));
            }
        }

        let mut roles = Vec::with_capacity(table.n_columns());
        for column in table.columns() {
            if Some(column.name()) == target {
                roles.push((column.name(), ColumnRole::Target));
                continue;
            }

            let mut counts = KindCounts::default();
            for value in column.values() {
                match value {
                    Value::Missing => {}
                    Value::Number(x) if x.is_nan() => {}
                    Value::Number(x) if x.is_infinite() => {
                        return Err(PreprocessingError::Schema(format!(
                            "column '{}' holds a non-finite number ({})",
                            column.name(),
                            x
                        )));
                    }
                    Value::Number(_) => counts.numbers += 1,
                    Value::Text(_) if value.as_number().is_some() => counts.numbers += 1,
                    Value::Text(_) => counts.other_text += 1,
                }
            }

            let role = if counts.other_text == 0 {
                ColumnRole::Numeric
            } else if counts.numbers == 0 {
                ColumnRole::Categorical
            } else {
                return Err(PreprocessingError::Schema(format!(
                    "column '{}' mixes {} numeric value(s) with {} non-numeric text value(s)",
                    column.name(),
                    counts.numbers,
                    counts.other_text
                )));
            };
            roles.push((column.name(), role));
        }

        Schema::from_roles(roles)
    }
}
