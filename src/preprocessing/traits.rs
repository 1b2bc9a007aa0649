//! Core traits for pipeline stages.
//!
//! This module defines the two central traits:
//! - [`Transformer`]: Used during fitting; has hyperparameters and learns from training rows.
//! - [`FittedTransformer`]: After fitting; immutable, ready for inference and serialization.
//!
//! Fitting and applying are separate calls on separate types, so a fitted
//! stage has no way to recompute its statistics from the data it transforms.

use crate::preprocessing::diagnostics::DiagnosticSink;
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::schema::Schema;
use crate::serialization::SerializableParams;

/// Trait for unfitted stages with hyperparameters.
///
/// # Type Parameters
/// - `Input`: Data the stage is fitted on and applied to.
/// - `Output`: Data produced by the fitted stage.
/// - `Params`: Serializable representation of learned parameters.
/// - `Fitted`: The corresponding fitted stage type.
///
/// # Example
/// ```ignore
/// use tabprep::preprocessing::{ImputationStage, Transformer, FittedTransformer, NullSink};
///
/// let stage = ImputationStage::new();
/// let fitted = stage.fit(&train, &schema)?;
/// let imputed = fitted.transform(&test, &NullSink)?;
/// ```
pub trait Transformer: Clone {
    /// Input data type.
    type Input;
    /// Output data type after transformation.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;
    /// The fitted stage type ready for inference.
    type Fitted: FittedTransformer<Params = Self::Params, Input = Self::Input, Output = Self::Output>;

    /// Learn parameters from training data.
    ///
    /// # Errors
    /// Returns [`PreprocessingError`] if:
    /// - Data is empty
    /// - A column carries no observed values
    /// - Data does not match the schema
    fn fit(&self, data: &Self::Input, schema: &Schema)
        -> Result<Self::Fitted, PreprocessingError>;

    /// Fit the stage and transform the same data in one step.
    fn fit_transform(
        &self,
        data: &Self::Input,
        schema: &Schema,
        sink: &dyn DiagnosticSink,
    ) -> Result<Self::Output, PreprocessingError> {
        let fitted = self.fit(data, schema)?;
        fitted.transform(data, sink)
    }
}

/// Trait for fitted stages ready for inference.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` is a round-trip.
/// - `transform` reads only the fitted parameters, never statistics of its argument.
pub trait FittedTransformer: Clone + Send + Sync {
    /// Input data type.
    type Input;
    /// Output data type after transformation.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;

    /// Transform data using learned parameters.
    ///
    /// Documented fallbacks (such as unseen categories) are reported to
    /// `sink` instead of failing.
    ///
    /// # Errors
    /// Returns [`PreprocessingError::SchemaMismatch`] if the input columns
    /// differ from the ones seen during fit.
    fn transform(
        &self,
        data: &Self::Input,
        sink: &dyn DiagnosticSink,
    ) -> Result<Self::Output, PreprocessingError>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted stage from parameters.
    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError>
    where
        Self: Sized;

    /// Save the fitted stage to a file.
    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {
        let params = self.extract_params();
        let bytes = params.to_bytes().map_err(std::io::Error::other)?;
        std::fs::write(path, bytes)
    }

    /// Load a fitted stage from a file.
    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, PreprocessingError>
    where
        Self: Sized,
    {
        let bytes = std::fs::read(path)?;
        let params = Self::Params::from_bytes(&bytes)
            .map_err(|e| PreprocessingError::SerializationError(e.to_string()))?;
        Self::from_params(params)
    }

    /// Number of input columns seen during fit.
    fn n_features_in(&self) -> usize;
}
