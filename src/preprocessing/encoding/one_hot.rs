//! One-hot encoding for categorical columns.
//!
//! Each categorical column is replaced by one indicator column per training
//! level, named `<column>_<level>`, in sorted-level order.
//!
//! Unknown levels are not an error: the row gets all-zero indicators for that
//! column and the occurrence is reported as [`PipelineEvent::UnseenCategory`].

use crate::preprocessing::diagnostics::{DiagnosticSink, PipelineEvent};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::frame::{FeatureMatrix, ImputedTable};
use crate::preprocessing::schema::Schema;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Name of the indicator column for `level` of `column`.
pub fn indicator_name(column: &str, level: &str) -> String {
    format!("{}_{}", column, level)
}

/// Serializable parameters for a fitted encoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodingParams {
    /// Sorted training levels per categorical column, in schema order.
    pub levels: IndexMap<String, Vec<String>>,
}

impl EncodingParams {
    /// Output column names, in output order.
    pub fn output_names(&self) -> Vec<String> {
        self.levels
            .iter()
            .flat_map(|(column, levels)| levels.iter().map(move |l| indicator_name(column, l)))
            .collect()
    }
}

/// One-hot encoding stage (unfitted).
///
/// # Example
/// ```ignore
/// use tabprep::preprocessing::{EncodingStage, Transformer, FittedTransformer, NullSink};
///
/// // currency = [USD, EUR, USD]
/// let fitted = EncodingStage::new().fit(&imputed, &schema)?;
///
/// // currency_EUR, currency_USD
/// let encoded = fitted.transform(&imputed, &NullSink)?;
/// // [[0, 1],
/// //  [1, 0],
/// //  [0, 1]]
/// ```
#[derive(Clone, Debug, Default)]
pub struct EncodingStage;

impl EncodingStage {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for EncodingStage {
    type Input = ImputedTable;
    type Output = FeatureMatrix;
    type Params = EncodingParams;
    type Fitted = FittedEncoding;

    fn fit(&self, data: &Self::Input, schema: &Schema) -> Result<Self::Fitted, PreprocessingError> {
        if data.n_rows() == 0 {
            return Err(PreprocessingError::EmptyDataset(
                "Cannot fit encoding on an empty table".to_string(),
            ));
        }
        data.check_categorical(&schema.categorical_columns())?;

        let levels: Vec<(String, Vec<String>)> = data
            .categorical()
            .par_iter()
            .map(|(name, values)| {
                let sorted: BTreeSet<&String> = values.iter().collect();
                let levels: Vec<String> = sorted.into_iter().cloned().collect();
                (name.clone(), levels)
            })
            .collect();

        let params = EncodingParams {
            levels: levels.into_iter().collect(),
        };

        // generated names must not collide with each other or with numeric columns
        let mut seen: HashSet<String> = schema
            .numeric_columns()
            .into_iter()
            .map(str::to_string)
            .collect();
        for name in params.output_names() {
            if !seen.insert(name.clone()) {
                return Err(PreprocessingError::Schema(format!(
                    "encoded column name '{}' is not unique",
                    name
                )));
            }
        }

        Ok(FittedEncoding { params })
    }
}

/// Fitted encoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedEncoding {
    params: EncodingParams,
}

impl FittedEncoding {
    /// Levels learned for a column, sorted.
    pub fn levels(&self, column: &str) -> Option<&[String]> {
        self.params.levels.get(column).map(Vec::as_slice)
    }

    /// Number of indicator columns produced.
    pub fn n_features_out(&self) -> usize {
        self.params.levels.values().map(Vec::len).sum()
    }
}

struct EncodedColumn {
    indicators: Vec<(String, Vec<f64>)>,
    unseen: BTreeMap<String, usize>,
}

fn encode_column(column: &str, levels: &[String], values: &[String]) -> EncodedColumn {
    let mut indicators: Vec<(String, Vec<f64>)> = levels
        .iter()
        .map(|level| (indicator_name(column, level), vec![0.0; values.len()]))
        .collect();
    let mut unseen = BTreeMap::new();

    for (row, value) in values.iter().enumerate() {
        match levels.binary_search(value) {
            Ok(idx) => indicators[idx].1[row] = 1.0,
            Err(_) => *unseen.entry(value.clone()).or_insert(0) += 1,
        }
    }

    EncodedColumn { indicators, unseen }
}

impl FittedTransformer for FittedEncoding {
    type Input = ImputedTable;
    type Output = FeatureMatrix;
    type Params = EncodingParams;

    fn transform(
        &self,
        data: &Self::Input,
        sink: &dyn DiagnosticSink,
    ) -> Result<Self::Output, PreprocessingError> {
        let expected: Vec<&str> = self.params.levels.keys().map(String::as_str).collect();
        data.check_categorical(&expected)?;

        let encoded: Vec<(String, EncodedColumn)> = self
            .params
            .levels
            .par_iter()
            .map(|(name, levels)| {
                let values = &data.categorical()[name.as_str()];
                (name.clone(), encode_column(name, levels, values))
            })
            .collect();

        let mut columns = Vec::with_capacity(self.n_features_out());
        for (name, column) in encoded {
            for (level, count) in column.unseen {
                sink.record(PipelineEvent::UnseenCategory {
                    column: name.clone(),
                    level,
                    count,
                });
            }
            columns.extend(column.indicators);
        }

        FeatureMatrix::from_columns(data.n_rows(), columns)
    }

    fn extract_params(&self) -> Self::Params {
        self.params.clone()
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        for (column, levels) in &params.levels {
            if !levels.windows(2).all(|w| w[0] < w[1]) {
                return Err(PreprocessingError::InvalidParameter(format!(
                    "levels of column '{}' are not sorted and unique",
                    column
                )));
            }
        }
        Ok(Self { params })
    }

    fn n_features_in(&self) -> usize {
        self.params.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::diagnostics::{CollectingSink, NullSink};
    use crate::preprocessing::schema::ColumnRole;

    fn table(values: &[&str]) -> ImputedTable {
        let mut categorical = IndexMap::new();
        categorical.insert(
            "label".to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        ImputedTable::new(values.len(), IndexMap::new(), categorical).unwrap()
    }

    fn schema() -> Schema {
        Schema::from_roles(vec![("label", ColumnRole::Categorical)]).unwrap()
    }

    #[test]
    fn test_one_hot_fit() {
        let fitted = EncodingStage::new()
            .fit(&table(&["B", "A", "B", "A", "A"]), &schema())
            .unwrap();
        assert_eq!(
            fitted.levels("label").unwrap(),
            &["A".to_string(), "B".to_string()]
        );
        assert_eq!(fitted.n_features_out(), 2);
    }

    #[test]
    fn test_one_hot_transform() {
        let data = table(&["A", "B", "A"]);
        let encoded = EncodingStage::new()
            .fit_transform(&data, &schema(), &NullSink)
            .unwrap();

        assert_eq!(
            encoded.column_names(),
            &["label_A".to_string(), "label_B".to_string()]
        );
        let expected = [1.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        for (a, b) in encoded.values().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_indicators_sum_to_one_for_seen_levels() {
        let data = table(&["x", "y", "z", "y"]);
        let encoded = EncodingStage::new()
            .fit_transform(&data, &schema(), &NullSink)
            .unwrap();
        for row in encoded.values().rows() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_unseen_level_is_all_zero() {
        let fitted = EncodingStage::new()
            .fit(&table(&["A", "B"]), &schema())
            .unwrap();
        let sink = CollectingSink::new();
        let encoded = fitted.transform(&table(&["C", "A", "C"]), &sink).unwrap();

        assert!(encoded.values().row(0).iter().all(|&x| x == 0.0));
        assert!((encoded.values().row(1).sum() - 1.0).abs() < 1e-12);
        assert_eq!(
            sink.events(),
            vec![PipelineEvent::UnseenCategory {
                column: "label".to_string(),
                level: "C".to_string(),
                count: 2,
            }]
        );
    }

    #[test]
    fn test_duplicate_generated_names() {
        let mut numeric = IndexMap::new();
        numeric.insert("label_A".to_string(), vec![1.0, 2.0]);
        let mut categorical = IndexMap::new();
        categorical.insert("label".to_string(), vec!["A".to_string(), "B".to_string()]);
        let data = ImputedTable::new(2, numeric, categorical).unwrap();
        let schema = Schema::from_roles(vec![
            ("label_A", ColumnRole::Numeric),
            ("label", ColumnRole::Categorical),
        ])
        .unwrap();

        assert!(matches!(
            EncodingStage::new().fit(&data, &schema),
            Err(PreprocessingError::Schema(_))
        ));
    }

    #[test]
    fn test_one_hot_column_mismatch() {
        let fitted = EncodingStage::new().fit(&table(&["A"]), &schema()).unwrap();
        let other = ImputedTable::new(0, IndexMap::new(), IndexMap::new()).unwrap();
        assert!(matches!(
            fitted.transform(&other, &NullSink),
            Err(PreprocessingError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_one_hot_save_load_file() {
        let data = table(&["red", "green", "blue"]);
        let fitted = EncodingStage::new().fit(&data, &schema()).unwrap();

        let temp_file = std::env::temp_dir().join("tabprep_one_hot_test.bin");
        fitted.save_to_file(&temp_file).unwrap();
        let loaded = FittedEncoding::load_from_file(&temp_file).unwrap();

        assert_eq!(loaded.extract_params(), fitted.extract_params());
        assert_eq!(
            loaded.transform(&data, &NullSink).unwrap(),
            fitted.transform(&data, &NullSink).unwrap()
        );

        std::fs::remove_file(temp_file).ok();
    }

    #[test]
    fn test_from_params_rejects_unsorted_levels() {
        let mut levels = IndexMap::new();
        levels.insert("c".to_string(), vec!["b".to_string(), "a".to_string()]);
        assert!(matches!(
            FittedEncoding::from_params(EncodingParams { levels }),
            Err(PreprocessingError::InvalidParameter(_))
        ));
    }
}
