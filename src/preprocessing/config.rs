//! Pipeline configuration.
//!
//! Every tunable of the pipeline lives here, as one serde-friendly struct
//! with enumerated options. Missing JSON fields fall back to the defaults:
//!
//! ```json
//! {
//!   "target": "fraud",
//!   "numeric_strategy": "Median",
//!   "categorical_strategy": "MostFrequent",
//!   "outlier_threshold": null,
//!   "window": 3,
//!   "alpha": 0.5,
//!   "rsi_window": null,
//!   "test_fraction": 0.2,
//!   "seed": 42
//! }
//! ```

use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::feature_engineering::FeatureEngineeringStage;
use crate::preprocessing::imputation::{CategoricalStrategy, NumericStrategy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for [`PreprocessingPipeline`](crate::preprocessing::PreprocessingPipeline).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name of the target column. Required by `prepare` and `transform_target`.
    pub target: Option<String>,
    pub numeric_strategy: NumericStrategy,
    pub categorical_strategy: CategoricalStrategy,
    /// Clip numeric values to `mean ± threshold·std` when set.
    pub outlier_threshold: Option<f64>,
    /// Moving-average window.
    pub window: usize,
    /// Exponential decay rate.
    pub alpha: f64,
    /// Window of the optional relative strength index.
    pub rsi_window: Option<usize>,
    /// Fraction of each class assigned to the test partition.
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target: None,
            numeric_strategy: NumericStrategy::default(),
            categorical_strategy: CategoricalStrategy::default(),
            outlier_threshold: None,
            window: 3,
            alpha: 0.5,
            rsi_window: None,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl PipelineConfig {
    /// Default configuration with the given target column.
    pub fn new(target: impl Into<String>) -> Self {
        Self::default().with_target(target)
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_numeric_strategy(mut self, strategy: NumericStrategy) -> Self {
        self.numeric_strategy = strategy;
        self
    }

    pub fn with_categorical_strategy(mut self, strategy: CategoricalStrategy) -> Self {
        self.categorical_strategy = strategy;
        self
    }

    pub fn with_outlier_threshold(mut self, threshold: Option<f64>) -> Self {
        self.outlier_threshold = threshold;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_rsi_window(mut self, rsi_window: Option<usize>) -> Self {
        self.rsi_window = rsi_window;
        self
    }

    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The feature-engineering stage described by this configuration.
    pub fn feature_engineering(&self) -> FeatureEngineeringStage {
        FeatureEngineeringStage::new()
            .with_window(self.window)
            .with_alpha(self.alpha)
            .with_rsi_window(self.rsi_window)
    }

    /// Check every option.
    ///
    /// # Errors
    /// Returns [`PreprocessingError::InvalidParameter`] naming the first bad option.
    pub fn validate(&self) -> Result<(), PreprocessingError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PreprocessingError::InvalidParameter(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if let Some(t) = self.outlier_threshold {
            if !(t.is_finite() && t > 0.0) {
                return Err(PreprocessingError::InvalidParameter(format!(
                    "outlier_threshold must be positive and finite, got {}",
                    t
                )));
            }
        }
        if let NumericStrategy::Constant(x) = self.numeric_strategy {
            if !x.is_finite() {
                return Err(PreprocessingError::InvalidParameter(format!(
                    "numeric constant fill must be finite, got {}",
                    x
                )));
            }
        }
        if matches!(self.target.as_deref(), Some("")) {
            return Err(PreprocessingError::InvalidParameter(
                "target column name is empty".to_string(),
            ));
        }
        self.feature_engineering().validate()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, PreprocessingError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PreprocessingError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, PreprocessingError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.window, 3);
        assert!((config.alpha - 0.5).abs() < 1e-12);
        assert!((config.test_fraction - 0.2).abs() < 1e-12);
        assert_eq!(config.numeric_strategy, NumericStrategy::Median);
        assert_eq!(config.categorical_strategy, CategoricalStrategy::MostFrequent);
        assert!(config.outlier_threshold.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = PipelineConfig::new("fraud")
            .with_window(5)
            .with_alpha(0.3)
            .with_seed(7)
            .with_numeric_strategy(NumericStrategy::Mean)
            .with_outlier_threshold(Some(2.0));
        assert_eq!(config.target.as_deref(), Some("fraud"));
        assert_eq!(config.window, 5);
        assert_eq!(config.seed, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_partial_fields_use_defaults() {
        let config = PipelineConfig::from_json_str(
            r#"{"target": "label", "window": 4, "numeric_strategy": {"Constant": 0.0}}"#,
        )
        .unwrap();
        assert_eq!(config.target.as_deref(), Some("label"));
        assert_eq!(config.window, 4);
        assert_eq!(config.numeric_strategy, NumericStrategy::Constant(0.0));
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_json_round_trip() {
        let config = PipelineConfig::new("fraud").with_rsi_window(Some(14));
        let json = config.to_json_string().unwrap();
        assert_eq!(PipelineConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_json_rejects_unknown_strategy() {
        let result = PipelineConfig::from_json_str(r#"{"numeric_strategy": "Mode"}"#);
        assert!(matches!(
            result,
            Err(PreprocessingError::SerializationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            PipelineConfig::default().with_test_fraction(0.0),
            PipelineConfig::default().with_test_fraction(1.0),
            PipelineConfig::default().with_window(0),
            PipelineConfig::default().with_alpha(0.0),
            PipelineConfig::default().with_outlier_threshold(Some(-1.0)),
            PipelineConfig::default().with_rsi_window(Some(0)),
            PipelineConfig::default().with_numeric_strategy(NumericStrategy::Constant(f64::NAN)),
            PipelineConfig::new(""),
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(PreprocessingError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_from_json_file() {
        let temp_file = std::env::temp_dir().join("tabprep_config_test.json");
        std::fs::write(&temp_file, r#"{"target": "fraud", "test_fraction": 0.4}"#).unwrap();

        let config = PipelineConfig::from_json_file(&temp_file).unwrap();
        assert!((config.test_fraction - 0.4).abs() < 1e-12);

        std::fs::remove_file(temp_file).ok();
    }
}
