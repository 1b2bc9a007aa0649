//! Sequence-dependent feature derivation.
//!
//! The stage collapses the scaled numeric columns of each row into one
//! source value (their row mean) and appends rolling aggregates of that
//! series as new columns:
//!
//! | Column | Definition |
//! |--------|------------|
//! | `moving_average` | mean of the trailing `window` source values |
//! | `exponential_moving_average` | `alpha * s[i] + (1 - alpha) * ema[i-1]` |
//! | `relative_strength_index` | optional, see [`rolling::relative_strength_index`] |
//!
//! The stage is stateless but row-order dependent. It must see the full table
//! in original row order, before any train/test partitioning.

pub mod rolling;

use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::frame::FeatureMatrix;
use serde::{Deserialize, Serialize};

pub use rolling::{exponential_moving_average, moving_average, relative_strength_index};

pub const MOVING_AVERAGE: &str = "moving_average";
pub const EXPONENTIAL_MOVING_AVERAGE: &str = "exponential_moving_average";
pub const RELATIVE_STRENGTH_INDEX: &str = "relative_strength_index";

/// Rolling-feature stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureEngineeringStage {
    window: usize,
    alpha: f64,
    rsi_window: Option<usize>,
}

impl Default for FeatureEngineeringStage {
    fn default() -> Self {
        Self {
            window: 3,
            alpha: 0.5,
            rsi_window: None,
        }
    }
}

impl FeatureEngineeringStage {
    /// Window 3, decay 0.5, no RSI.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Also emit `relative_strength_index` over this many values.
    pub fn with_rsi_window(mut self, rsi_window: Option<usize>) -> Self {
        self.rsi_window = rsi_window;
        self
    }

    /// Names of the columns this stage appends, in order.
    pub fn output_names(&self) -> Vec<String> {
        let mut names = vec![
            MOVING_AVERAGE.to_string(),
            EXPONENTIAL_MOVING_AVERAGE.to_string(),
        ];
        if self.rsi_window.is_some() {
            names.push(RELATIVE_STRENGTH_INDEX.to_string());
        }
        names
    }

    /// Check the hyperparameters.
    pub fn validate(&self) -> Result<(), PreprocessingError> {
        if self.window == 0 {
            return Err(PreprocessingError::InvalidParameter(
                "window must be at least 1".to_string(),
            ));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(PreprocessingError::InvalidParameter(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if self.rsi_window == Some(0) {
            return Err(PreprocessingError::InvalidParameter(
                "rsi_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Row mean of the source columns; `0.0` for every row when there are none.
    pub fn source_sequence<S: AsRef<str>>(
        &self,
        matrix: &FeatureMatrix,
        source_columns: &[S],
    ) -> Result<Vec<f64>, PreprocessingError> {
        let mut sums = vec![0.0; matrix.n_rows()];
        for name in source_columns {
            let column = matrix.column(name.as_ref()).ok_or_else(|| {
                PreprocessingError::SchemaMismatch {
                    expected: format!("column '{}'", name.as_ref()),
                    got: format!("{:?}", matrix.column_names()),
                }
            })?;
            for (sum, x) in sums.iter_mut().zip(column.iter()) {
                *sum += x;
            }
        }

        if !source_columns.is_empty() {
            let n = source_columns.len() as f64;
            sums.iter_mut().for_each(|s| *s /= n);
        }
        Ok(sums)
    }

    /// Append the rolling columns to `matrix`.
    ///
    /// # Errors
    /// - [`PreprocessingError::InvalidParameter`] for invalid hyperparameters
    /// - [`PreprocessingError::SchemaMismatch`] if a source column is absent
    /// - [`PreprocessingError::Schema`] if an output name is already taken
    pub fn apply<S: AsRef<str>>(
        &self,
        matrix: &FeatureMatrix,
        source_columns: &[S],
    ) -> Result<FeatureMatrix, PreprocessingError> {
        self.validate()?;
        let series = self.source_sequence(matrix, source_columns)?;

        let mut columns = vec![
            (MOVING_AVERAGE.to_string(), moving_average(&series, self.window)),
            (
                EXPONENTIAL_MOVING_AVERAGE.to_string(),
                exponential_moving_average(&series, self.alpha),
            ),
        ];
        if let Some(rsi_window) = self.rsi_window {
            columns.push((
                RELATIVE_STRENGTH_INDEX.to_string(),
                relative_strength_index(&series, rsi_window),
            ));
        }

        let engineered = FeatureMatrix::from_columns(matrix.n_rows(), columns)?;
        matrix.hstack(&engineered)
    }
}
