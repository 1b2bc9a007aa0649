//! Standardization of numeric columns (z-score).
//!
//! The standard score of a value `x` is calculated as:
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the training mean and `s` the population standard deviation
//! of the training values.
//!
//! A column that is constant in training has `s = 0`. It is marked
//! `degenerate` and always mapped to zeros instead of dividing by zero.
//!
//! # Example
//! ```ignore
//! use tabprep::preprocessing::{ScalingStage, Transformer, FittedTransformer, NullSink};
//!
//! let fitted = ScalingStage::new().fit(&imputed_train, &schema)?;
//! let scaled = fitted.transform(&imputed_test, &NullSink)?;
//!
//! // Later, for inference:
//! fitted.save_to_file("scaler.bin")?;
//! let loaded = FittedScaling::load_from_file("scaler.bin")?;
//! ```

use crate::preprocessing::diagnostics::DiagnosticSink;
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::frame::{FeatureMatrix, ImputedTable};
use crate::preprocessing::schema::Schema;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Learned statistics of one numeric column.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnScale {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// The column was constant in training and is emitted as zeros.
    pub degenerate: bool,
}

impl ColumnScale {
    fn fit(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();
        // relative tolerance absorbs the rounding of the mean of identical values
        let degenerate = std <= 1e-12 * (1.0 + mean.abs());
        Self {
            mean,
            std,
            degenerate,
        }
    }

    /// Standardize one value.
    pub fn apply(&self, x: f64) -> f64 {
        if self.degenerate {
            0.0
        } else {
            (x - self.mean) / self.std
        }
    }
}

/// Serializable parameters for a fitted scaling stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleParams {
    /// Statistics per numeric column, in schema order.
    pub columns: IndexMap<String, ColumnScale>,
}

// Note: SerializableParams comes from the blanket impl in serialization.rs

/// Scaling stage (unfitted).
#[derive(Clone, Debug, Default)]
pub struct ScalingStage;

impl ScalingStage {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for ScalingStage {
    type Input = ImputedTable;
    type Output = FeatureMatrix;
    type Params = ScaleParams;
    type Fitted = FittedScaling;

    fn fit(&self, data: &Self::Input, schema: &Schema) -> Result<Self::Fitted, PreprocessingError> {
        if data.n_rows() == 0 {
            return Err(PreprocessingError::EmptyDataset(
                "Cannot fit scaling on an empty table".to_string(),
            ));
        }
        data.check_numeric(&schema.numeric_columns())?;

        let columns: Vec<(String, ColumnScale)> = data
            .numeric()
            .par_iter()
            .map(|(name, values)| (name.clone(), ColumnScale::fit(values)))
            .collect();

        Ok(FittedScaling {
            params: ScaleParams {
                columns: columns.into_iter().collect(),
            },
        })
    }
}

/// Fitted scaling stage ready for inference.
#[derive(Clone, Debug)]
pub struct FittedScaling {
    params: ScaleParams,
}

impl FittedScaling {
    /// Statistics learned for a column.
    pub fn column(&self, name: &str) -> Option<&ColumnScale> {
        self.params.columns.get(name)
    }

    /// Names of the columns that were constant in training.
    pub fn degenerate_columns(&self) -> Vec<&str> {
        self.params
            .columns
            .iter()
            .filter(|(_, scale)| scale.degenerate)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl FittedTransformer for FittedScaling {
    type Input = ImputedTable;
    type Output = FeatureMatrix;
    type Params = ScaleParams;

    fn transform(
        &self,
        data: &Self::Input,
        _sink: &dyn DiagnosticSink,
    ) -> Result<Self::Output, PreprocessingError> {
        let expected: Vec<&str> = self.params.columns.keys().map(String::as_str).collect();
        data.check_numeric(&expected)?;

        let columns: Vec<(String, Vec<f64>)> = self
            .params
            .columns
            .par_iter()
            .map(|(name, scale)| {
                let values: Vec<f64> = data.numeric()[name.as_str()]
                    .iter()
                    .map(|&x| scale.apply(x))
                    .collect();
                (name.clone(), values)
            })
            .collect();

        FeatureMatrix::from_columns(data.n_rows(), columns)
    }

    fn extract_params(&self) -> Self::Params {
        self.params.clone()
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        if let Some((name, _)) = params
            .columns
            .iter()
            .find(|(_, s)| !s.degenerate && !(s.std.is_finite() && s.std > 0.0))
        {
            return Err(PreprocessingError::InvalidParameter(format!(
                "column '{}' has a non-positive standard deviation but is not degenerate",
                name
            )));
        }
        Ok(Self { params })
    }

    fn n_features_in(&self) -> usize {
        self.params.columns.len()
    }
}
