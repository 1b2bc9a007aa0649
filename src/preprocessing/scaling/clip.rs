//! Outlier clipping.
//!
//! Numeric values further than `threshold` population standard deviations
//! from the training mean are clamped onto the nearest bound. Rows are never
//! dropped, so row count and row order survive the stage unchanged.

use crate::preprocessing::diagnostics::{DiagnosticSink, PipelineEvent};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::frame::ImputedTable;
use crate::preprocessing::schema::Schema;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Default distance from the mean, in standard deviations.
pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// Inclusive bounds of one numeric column.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipBounds {
    pub lower: f64,
    pub upper: f64,
}

/// Serializable parameters for a fitted clipper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipParams {
    pub threshold: f64,
    /// Bounds per numeric column, in schema order.
    pub bounds: IndexMap<String, ClipBounds>,
}

/// Outlier clipper (unfitted).
#[derive(Clone, Debug)]
pub struct OutlierClipper {
    threshold: f64,
}

impl Default for OutlierClipper {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl OutlierClipper {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Transformer for OutlierClipper {
    type Input = ImputedTable;
    type Output = ImputedTable;
    type Params = ClipParams;
    type Fitted = FittedClipper;

    fn fit(&self, data: &Self::Input, schema: &Schema) -> Result<Self::Fitted, PreprocessingError> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(PreprocessingError::InvalidParameter(format!(
                "outlier threshold must be positive and finite, got {}",
                self.threshold
            )));
        }
        if data.n_rows() == 0 {
            return Err(PreprocessingError::EmptyDataset(
                "Cannot fit clipping on an empty table".to_string(),
            ));
        }
        data.check_numeric(&schema.numeric_columns())?;

        let threshold = self.threshold;
        let bounds: Vec<(String, ClipBounds)> = data
            .numeric()
            .par_iter()
            .map(|(name, values)| {
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let std = (values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
                let bounds = ClipBounds {
                    lower: mean - threshold * std,
                    upper: mean + threshold * std,
                };
                (name.clone(), bounds)
            })
            .collect();

        Ok(FittedClipper {
            params: ClipParams {
                threshold,
                bounds: bounds.into_iter().collect(),
            },
        })
    }
}

/// Fitted clipper ready for inference.
#[derive(Clone, Debug)]
pub struct FittedClipper {
    params: ClipParams,
}

impl FittedClipper {
    /// Bounds learned for a column.
    pub fn bounds(&self, column: &str) -> Option<ClipBounds> {
        self.params.bounds.get(column).copied()
    }
}

impl FittedTransformer for FittedClipper {
    type Input = ImputedTable;
    type Output = ImputedTable;
    type Params = ClipParams;

    fn transform(
        &self,
        data: &Self::Input,
        sink: &dyn DiagnosticSink,
    ) -> Result<Self::Output, PreprocessingError> {
        let expected: Vec<&str> = self.params.bounds.keys().map(String::as_str).collect();
        data.check_numeric(&expected)?;

        let clipped: Vec<(String, Vec<f64>, usize)> = self
            .params
            .bounds
            .par_iter()
            .map(|(name, b)| {
                let mut count = 0;
                let values: Vec<f64> = data.numeric()[name.as_str()]
                    .iter()
                    .map(|&x| {
                        let y = x.clamp(b.lower, b.upper);
                        if y != x {
                            count += 1;
                        }
                        y
                    })
                    .collect();
                (name.clone(), values, count)
            })
            .collect();

        for (name, _, count) in &clipped {
            if *count > 0 {
                sink.record(PipelineEvent::ValuesClipped {
                    column: name.clone(),
                    count: *count,
                });
            }
        }

        let numeric = clipped.into_iter().map(|(n, v, _)| (n, v)).collect();
        Ok(data.clone().with_numeric(numeric))
    }

    fn extract_params(&self) -> Self::Params {
        self.params.clone()
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        if let Some((name, _)) = params.bounds.iter().find(|(_, b)| !(b.lower <= b.upper)) {
            return Err(PreprocessingError::InvalidParameter(format!(
                "clip bounds of column '{}' are inverted",
                name
            )));
        }
        Ok(Self { params })
    }

    fn n_features_in(&self) -> usize {
        self.params.bounds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::diagnostics::{CollectingSink, NullSink};
    use crate::preprocessing::schema::ColumnRole;

    fn create_test_data() -> (ImputedTable, Schema) {
        let mut numeric = IndexMap::new();
        numeric.insert(
            "amount".to_string(),
            vec![10.0, 11.0, 9.0, 10.0, 12.0, 8.0, 10.0, 11.0, 9.0, 100.0],
        );
        let mut categorical = IndexMap::new();
        categorical.insert("currency".to_string(), vec!["USD".to_string(); 10]);
        let table = ImputedTable::new(10, numeric, categorical).unwrap();
        let schema = Schema::from_roles(vec![
            ("amount", ColumnRole::Numeric),
            ("currency", ColumnRole::Categorical),
        ])
        .unwrap();
        (table, schema)
    }

    #[test]
    fn test_outlier_clamped_to_upper_bound() {
        let (data, schema) = create_test_data();
        let fitted = OutlierClipper::default().fit(&data, &schema).unwrap();
        let bounds = fitted.bounds("amount").unwrap();

        let clipped = fitted.transform(&data, &NullSink).unwrap();
        let amount = clipped.numeric_column("amount").unwrap();

        assert!((amount[9] - bounds.upper).abs() < 1e-12);
        assert!((amount[0] - 10.0).abs() < 1e-12);
        assert_eq!(clipped.n_rows(), 10);
    }

    #[test]
    fn test_categorical_block_untouched() {
        let (data, schema) = create_test_data();
        let clipped = OutlierClipper::default()
            .fit_transform(&data, &schema, &NullSink)
            .unwrap();
        assert_eq!(clipped.categorical(), data.categorical());
    }

    #[test]
    fn test_clip_counts_reported() {
        let (data, schema) = create_test_data();
        let sink = CollectingSink::new();
        OutlierClipper::default()
            .fit_transform(&data, &schema, &sink)
            .unwrap();
        assert_eq!(
            sink.events(),
            vec![PipelineEvent::ValuesClipped {
                column: "amount".to_string(),
                count: 1,
            }]
        );
    }

    #[test]
    fn test_invalid_threshold() {
        let (data, schema) = create_test_data();
        for threshold in [0.0, -1.0, f64::INFINITY] {
            assert!(matches!(
                OutlierClipper::new(threshold).fit(&data, &schema),
                Err(PreprocessingError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_params_round_trip() {
        let (data, schema) = create_test_data();
        let fitted = OutlierClipper::new(3.0).fit(&data, &schema).unwrap();
        let restored = FittedClipper::from_params(fitted.extract_params()).unwrap();
        assert_eq!(restored.bounds("amount"), fitted.bounds("amount"));
    }
}
