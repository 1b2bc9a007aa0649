//! Role-aware imputation.
//!
//! Numeric columns are filled with a statistic of their observed training
//! values, categorical columns with a training level. Fill values are learned
//! once, on the training rows, and reused verbatim for every later table.
//!
//! Note: `NaN` counts as missing, exactly like [`Value::Missing`].
//!
//! # Example
//! ```ignore
//! use tabprep::preprocessing::{ImputationStage, NumericStrategy, Transformer, FittedTransformer, NullSink};
//!
//! let stage = ImputationStage::new().with_numeric_strategy(NumericStrategy::Mean);
//! let fitted = stage.fit(&train, &schema)?;
//! let imputed = fitted.transform(&test, &NullSink)?;
//! ```

use crate::dataset::{Column, RawTable, Value};
use crate::preprocessing::diagnostics::{DiagnosticSink, PipelineEvent};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::frame::ImputedTable;
use crate::preprocessing::schema::Schema;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy for filling numeric columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum NumericStrategy {
    /// Replace missing values with the training median.
    #[default]
    Median,
    /// Replace missing values with the training mean.
    Mean,
    /// Replace missing values with a constant.
    Constant(f64),
}

/// Strategy for filling categorical columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CategoricalStrategy {
    /// Replace missing values with the most frequent training level.
    /// Ties go to the lexicographically smallest level.
    #[default]
    MostFrequent,
    /// Replace missing values with a constant level.
    Constant(String),
}

/// Serializable parameters for a fitted imputation stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImputationParams {
    /// Schema the stage was fitted with.
    pub schema: Schema,
    pub numeric_strategy: NumericStrategy,
    pub categorical_strategy: CategoricalStrategy,
    /// Fill value per numeric column, in schema order.
    pub numeric_fill: IndexMap<String, f64>,
    /// Fill level per categorical column, in schema order.
    pub categorical_fill: IndexMap<String, String>,
}

/// Imputation stage (unfitted).
#[derive(Clone, Debug, Default)]
pub struct ImputationStage {
    numeric_strategy: NumericStrategy,
    categorical_strategy: CategoricalStrategy,
}

impl ImputationStage {
    /// Create a stage with median / most-frequent filling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the numeric fill strategy.
    pub fn with_numeric_strategy(mut self, strategy: NumericStrategy) -> Self {
        self.numeric_strategy = strategy;
        self
    }

    /// Set the categorical fill strategy.
    pub fn with_categorical_strategy(mut self, strategy: CategoricalStrategy) -> Self {
        self.categorical_strategy = strategy;
        self
    }
}

/// Read a numeric column, keeping absent entries as `None`.
fn numeric_values(column: &Column) -> Result<Vec<Option<f64>>, PreprocessingError> {
    column
        .values()
        .iter()
        .map(|value| {
            if value.is_missing() {
                return Ok(None);
            }
            value.as_number().map(Some).ok_or_else(|| {
                PreprocessingError::SchemaMismatch {
                    expected: format!("numeric values in column '{}'", column.name()),
                    got: format!("{:?}", value),
                }
            })
        })
        .collect()
}

fn categorical_values(column: &Column) -> Vec<Option<String>> {
    column.values().iter().map(Value::as_level).collect()
}

fn required_column<'a>(table: &'a RawTable, name: &str) -> Result<&'a Column, PreprocessingError> {
    table
        .column(name)
        .ok_or_else(|| PreprocessingError::SchemaMismatch {
            expected: format!("column '{}'", name),
            got: format!("{:?}", table.column_names()),
        })
}

fn median(mut observed: Vec<f64>) -> f64 {
    observed.sort_by(f64::total_cmp);
    let n = observed.len();
    if n % 2 == 0 {
        (observed[n / 2 - 1] + observed[n / 2]) / 2.0
    } else {
        observed[n / 2]
    }
}

fn fit_numeric_fill(
    column: &Column,
    strategy: &NumericStrategy,
) -> Result<f64, PreprocessingError> {
    let observed: Vec<f64> = numeric_values(column)?.into_iter().flatten().collect();
    if observed.is_empty() {
        return Err(PreprocessingError::EmptyColumn {
            column: column.name().to_string(),
        });
    }

    Ok(match strategy {
        NumericStrategy::Median => median(observed),
        NumericStrategy::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
        NumericStrategy::Constant(value) => *value,
    })
}

fn fit_categorical_fill(
    column: &Column,
    strategy: &CategoricalStrategy,
) -> Result<String, PreprocessingError> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for level in categorical_values(column).into_iter().flatten() {
        *counts.entry(level).or_insert(0) += 1;
    }

    // BTreeMap iterates levels in sorted order; strict `>` keeps the smallest on ties
    let mut best: Option<(String, usize)> = None;
    for (level, count) in counts {
        if best.as_ref().map_or(true, |(_, c)| count > *c) {
            best = Some((level, count));
        }
    }

    let (mode, _) = best.ok_or_else(|| PreprocessingError::EmptyColumn {
        column: column.name().to_string(),
    })?;

    Ok(match strategy {
        CategoricalStrategy::MostFrequent => mode,
        CategoricalStrategy::Constant(level) => level.clone(),
    })
}

impl Transformer for ImputationStage {
    type Input = RawTable;
    type Output = ImputedTable;
    type Params = ImputationParams;
    type Fitted = FittedImputation;

    fn fit(&self, data: &Self::Input, schema: &Schema) -> Result<Self::Fitted, PreprocessingError> {
        if data.is_empty() {
            return Err(PreprocessingError::EmptyDataset(
                "Cannot fit imputation on an empty table".to_string(),
            ));
        }
        schema.check_table(data)?;

        let numeric_fill = schema
            .numeric_columns()
            .par_iter()
            .map(|&name| -> Result<(String, f64), PreprocessingError> {
                let column = required_column(data, name)?;
                Ok((name.to_string(), fit_numeric_fill(column, &self.numeric_strategy)?))
            })
            .collect::<Result<Vec<_>, PreprocessingError>>()?
            .into_iter()
            .collect();

        let categorical_fill = schema
            .categorical_columns()
            .par_iter()
            .map(|&name| -> Result<(String, String), PreprocessingError> {
                let column = required_column(data, name)?;
                Ok((
                    name.to_string(),
                    fit_categorical_fill(column, &self.categorical_strategy)?,
                ))
            })
            .collect::<Result<Vec<_>, PreprocessingError>>()?
            .into_iter()
            .collect();

        Ok(FittedImputation {
            params: ImputationParams {
                schema: schema.clone(),
                numeric_strategy: self.numeric_strategy.clone(),
                categorical_strategy: self.categorical_strategy.clone(),
                numeric_fill,
                categorical_fill,
            },
        })
    }
}

/// Fitted imputation stage ready for inference.
#[derive(Clone, Debug)]
pub struct FittedImputation {
    params: ImputationParams,
}

impl FittedImputation {
    /// Fill value learned for a numeric column.
    pub fn numeric_fill(&self, column: &str) -> Option<f64> {
        self.params.numeric_fill.get(column).copied()
    }

    /// Fill level learned for a categorical column.
    pub fn categorical_fill(&self, column: &str) -> Option<&str> {
        self.params.categorical_fill.get(column).map(String::as_str)
    }

    /// Schema the stage was fitted with.
    pub fn schema(&self) -> &Schema {
        &self.params.schema
    }
}

impl FittedTransformer for FittedImputation {
    type Input = RawTable;
    type Output = ImputedTable;
    type Params = ImputationParams;

    fn transform(
        &self,
        data: &Self::Input,
        sink: &dyn DiagnosticSink,
    ) -> Result<Self::Output, PreprocessingError> {
        self.params.schema.check_table(data)?;

        let numeric: Vec<(String, Vec<f64>, usize)> = self
            .params
            .numeric_fill
            .par_iter()
            .map(|(name, &fill)| -> Result<(String, Vec<f64>, usize), PreprocessingError> {
                let values = numeric_values(required_column(data, name)?)?;
                let missing = values.iter().filter(|v| v.is_none()).count();
                let filled: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(fill)).collect();
                Ok((name.clone(), filled, missing))
            })
            .collect::<Result<_, PreprocessingError>>()?;

        let categorical: Vec<(String, Vec<String>, usize)> = self
            .params
            .categorical_fill
            .par_iter()
            .map(|(name, fill)| -> Result<(String, Vec<String>, usize), PreprocessingError> {
                let values = categorical_values(required_column(data, name)?);
                let missing = values.iter().filter(|v| v.is_none()).count();
                let filled: Vec<String> = values
                    .into_iter()
                    .map(|v| v.unwrap_or_else(|| fill.clone()))
                    .collect();
                Ok((name.clone(), filled, missing))
            })
            .collect::<Result<_, PreprocessingError>>()?;

        let numeric_counts = numeric.iter().map(|(name, _, missing)| (name, *missing));
        let categorical_counts = categorical.iter().map(|(name, _, missing)| (name, *missing));
        for (name, missing) in numeric_counts.chain(categorical_counts) {
            if missing > 0 {
                sink.record(PipelineEvent::MissingImputed {
                    column: name.clone(),
                    count: missing,
                });
            }
        }

        ImputedTable::new(
            data.n_rows(),
            numeric.into_iter().map(|(n, v, _)| (n, v)).collect(),
            categorical.into_iter().map(|(n, v, _)| (n, v)).collect(),
        )
    }

    fn extract_params(&self) -> Self::Params {
        self.params.clone()
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        let schema = &params.schema;
        let covered = schema
            .numeric_columns()
            .iter()
            .all(|name| params.numeric_fill.contains_key(*name))
            && schema
                .categorical_columns()
                .iter()
                .all(|name| params.categorical_fill.contains_key(*name));
        if !covered {
            return Err(PreprocessingError::InvalidParameter(
                "imputation fill values do not cover the schema".to_string(),
            ));
        }
        Ok(Self { params })
    }

    fn n_features_in(&self) -> usize {
        self.params.schema.feature_columns().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::diagnostics::{CollectingSink, NullSink};
    use crate::preprocessing::schema::SchemaInspector;

    fn train_table() -> RawTable {
        RawTable::new(vec![
            Column::numeric("amount", vec![Some(10.0), None, Some(30.0), Some(40.0)]),
            Column::text("currency", vec![Some("USD"), Some("EUR"), None, Some("EUR")]),
            Column::numeric("fraud", vec![Some(0.0), Some(1.0), Some(0.0), Some(1.0)]),
        ])
        .unwrap()
    }

    fn schema() -> Schema {
        SchemaInspector::new()
            .inspect(&train_table(), Some("fraud"))
            .unwrap()
    }

    #[test]
    fn test_median_and_mode_fill() {
        let fitted = ImputationStage::new().fit(&train_table(), &schema()).unwrap();

        assert!((fitted.numeric_fill("amount").unwrap() - 30.0).abs() < 1e-12);
        assert_eq!(fitted.categorical_fill("currency"), Some("EUR"));

        let imputed = fitted.transform(&train_table(), &NullSink).unwrap();
        assert_eq!(
            imputed.numeric_column("amount").unwrap(),
            &[10.0, 30.0, 30.0, 40.0]
        );
        assert_eq!(imputed.categorical_column("currency").unwrap()[2], "EUR");
    }

    #[test]
    fn test_no_missing_after_imputation() {
        let fitted = ImputationStage::new().fit(&train_table(), &schema()).unwrap();
        let imputed = fitted.transform(&train_table(), &NullSink).unwrap();
        assert!(imputed
            .numeric()
            .values()
            .all(|col| col.iter().all(|x| x.is_finite())));
        assert_eq!(imputed.n_rows(), 4);
    }

    #[test]
    fn test_mean_and_constant_strategies() {
        let fitted = ImputationStage::new()
            .with_numeric_strategy(NumericStrategy::Mean)
            .with_categorical_strategy(CategoricalStrategy::Constant("UNK".to_string()))
            .fit(&train_table(), &schema())
            .unwrap();

        assert!((fitted.numeric_fill("amount").unwrap() - 80.0 / 3.0).abs() < 1e-12);
        assert_eq!(fitted.categorical_fill("currency"), Some("UNK"));

        let fitted = ImputationStage::new()
            .with_numeric_strategy(NumericStrategy::Constant(-1.0))
            .fit(&train_table(), &schema())
            .unwrap();
        assert!((fitted.numeric_fill("amount").unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mode_tie_breaks_lexicographically() {
        let table = RawTable::new(vec![Column::text(
            "color",
            vec![Some("red"), Some("blue"), Some("red"), Some("blue")],
        )])
        .unwrap();
        let schema = SchemaInspector::new().inspect(&table, None).unwrap();
        let fitted = ImputationStage::new().fit(&table, &schema).unwrap();
        assert_eq!(fitted.categorical_fill("color"), Some("blue"));
    }

    #[test]
    fn test_fill_values_come_from_training_only() {
        let fitted = ImputationStage::new().fit(&train_table(), &schema()).unwrap();
        let test = RawTable::new(vec![
            Column::numeric("amount", vec![None, Some(1000.0), Some(2000.0)]),
            Column::text("currency", vec![None, Some("GBP"), Some("GBP")]),
        ])
        .unwrap();

        let imputed = fitted.transform(&test, &NullSink).unwrap();
        assert!((imputed.numeric_column("amount").unwrap()[0] - 30.0).abs() < 1e-12);
        assert_eq!(imputed.categorical_column("currency").unwrap()[0], "EUR");
    }

    #[test]
    fn test_all_missing_column_fails() {
        let table = RawTable::new(vec![
            Column::numeric("empty", vec![None, None]),
            Column::text("label", vec![Some("a"), Some("b")]),
        ])
        .unwrap();
        let schema = SchemaInspector::new().inspect(&table, Some("label")).unwrap();
        let result = ImputationStage::new()
            .with_numeric_strategy(NumericStrategy::Constant(0.0))
            .fit(&table, &schema);
        assert!(matches!(
            result,
            Err(PreprocessingError::EmptyColumn { ref column }) if column == "empty"
        ));
    }

    #[test]
    fn test_empty_table_fails() {
        let empty = train_table().select_rows(&[]).unwrap();
        let result = ImputationStage::new().fit(&empty, &schema());
        assert!(matches!(result, Err(PreprocessingError::EmptyDataset(_))));
    }

    #[test]
    fn test_schema_mismatch_on_transform() {
        let fitted = ImputationStage::new().fit(&train_table(), &schema()).unwrap();

        let missing_column =
            RawTable::new(vec![Column::numeric("amount", vec![Some(1.0)])]).unwrap();
        assert!(matches!(
            fitted.transform(&missing_column, &NullSink),
            Err(PreprocessingError::SchemaMismatch { .. })
        ));

        let wrong_kind = RawTable::new(vec![
            Column::text("amount", vec![Some("lots")]),
            Column::text("currency", vec![Some("USD")]),
        ])
        .unwrap();
        assert!(matches!(
            fitted.transform(&wrong_kind, &NullSink),
            Err(PreprocessingError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_imputed_counts_reported() {
        let sink = CollectingSink::new();
        let fitted = ImputationStage::new().fit(&train_table(), &schema()).unwrap();
        fitted.transform(&train_table(), &sink).unwrap();

        let events = sink.events();
        assert!(events.contains(&PipelineEvent::MissingImputed {
            column: "amount".to_string(),
            count: 1,
        }));
        assert!(events.contains(&PipelineEvent::MissingImputed {
            column: "currency".to_string(),
            count: 1,
        }));
    }

    #[test]
    fn test_save_load_file() {
        let fitted = ImputationStage::new().fit(&train_table(), &schema()).unwrap();

        let temp_file = std::env::temp_dir().join("tabprep_imputation_test.bin");
        fitted.save_to_file(&temp_file).unwrap();
        let loaded = FittedImputation::load_from_file(&temp_file).unwrap();

        assert_eq!(loaded.extract_params(), fitted.extract_params());
        assert_eq!(loaded.n_features_in(), 2);

        std::fs::remove_file(temp_file).ok();
    }
}
