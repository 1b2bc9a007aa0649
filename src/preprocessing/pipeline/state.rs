//! Immutable fitted state of a pipeline.
//!
//! A [`FittedState`] is produced once per `fit` and never mutated. It owns the
//! fitted stages, ready to transform, and converts to and from the plain-data
//! [`FittedStateParams`] that is persisted as an opaque versioned blob.

use crate::preprocessing::encoding::{
    EncodingParams, FittedEncoding, FittedLabelEncoder, LabelEncoderParams,
};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::feature_engineering::FeatureEngineeringStage;
use crate::preprocessing::imputation::{FittedImputation, ImputationParams};
use crate::preprocessing::scaling::{ClipParams, FittedClipper, FittedScaling, ScaleParams};
use crate::preprocessing::schema::Schema;
use crate::preprocessing::traits::FittedTransformer;
use crate::serialization::SerializableParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version of the persisted blob layout.
pub const FORMAT_VERSION: u32 = 1;

/// Plain-data snapshot of a [`FittedState`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedStateParams {
    pub version: u32,
    pub schema: Schema,
    pub imputation: ImputationParams,
    pub clipping: Option<ClipParams>,
    pub scaling: ScaleParams,
    pub encoding: EncodingParams,
    pub target: Option<LabelEncoderParams>,
    pub feature_engineering: FeatureEngineeringStage,
    pub feature_names: Vec<String>,
}

/// Fitted stages plus the output layout they produce.
#[derive(Clone, Debug)]
pub struct FittedState {
    pub(crate) schema: Schema,
    pub(crate) imputation: FittedImputation,
    pub(crate) clipping: Option<FittedClipper>,
    pub(crate) scaling: FittedScaling,
    pub(crate) encoding: FittedEncoding,
    pub(crate) target: Option<FittedLabelEncoder>,
    pub(crate) feature_engineering: FeatureEngineeringStage,
    pub(crate) feature_names: Vec<String>,
}

impl FittedState {
    /// Column roles inferred from the training table.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Names of the transformed feature columns, in output order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Names of the columns appended by feature engineering.
    pub fn engineered_names(&self) -> Vec<String> {
        self.feature_engineering.output_names()
    }

    /// Feature columns followed by engineered columns.
    pub fn output_names(&self) -> Vec<String> {
        let mut names = self.feature_names.clone();
        names.extend(self.engineered_names());
        names
    }

    /// Target classes in index order, if a target was fitted.
    pub fn target_classes(&self) -> Option<&[String]> {
        self.target.as_ref().map(FittedLabelEncoder::classes)
    }

    pub fn imputation(&self) -> &FittedImputation {
        &self.imputation
    }

    pub fn clipping(&self) -> Option<&FittedClipper> {
        self.clipping.as_ref()
    }

    pub fn scaling(&self) -> &FittedScaling {
        &self.scaling
    }

    pub fn encoding(&self) -> &FittedEncoding {
        &self.encoding
    }

    pub fn label_encoder(&self) -> Option<&FittedLabelEncoder> {
        self.target.as_ref()
    }

    pub fn feature_engineering(&self) -> &FeatureEngineeringStage {
        &self.feature_engineering
    }

    /// Extract a plain-data snapshot.
    pub fn extract_params(&self) -> FittedStateParams {
        FittedStateParams {
            version: FORMAT_VERSION,
            schema: self.schema.clone(),
            imputation: self.imputation.extract_params(),
            clipping: self.clipping.as_ref().map(FittedClipper::extract_params),
            scaling: self.scaling.extract_params(),
            encoding: self.encoding.extract_params(),
            target: self.target.as_ref().map(FittedLabelEncoder::extract_params),
            feature_engineering: self.feature_engineering.clone(),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Rebuild the fitted stages from a snapshot.
    ///
    /// # Errors
    /// - [`PreprocessingError::SerializationError`] on a format version mismatch
    /// - [`PreprocessingError::InvalidParameter`] if the stages are inconsistent
    ///   with each other or with the schema
    pub fn from_params(params: FittedStateParams) -> Result<Self, PreprocessingError> {
        if params.version != FORMAT_VERSION {
            return Err(PreprocessingError::SerializationError(format!(
                "unsupported fitted state version {} (expected {})",
                params.version, FORMAT_VERSION
            )));
        }
        params.feature_engineering.validate()?;

        let scaling = FittedScaling::from_params(params.scaling)?;
        let encoding = FittedEncoding::from_params(params.encoding)?;

        let expected: Vec<String> = scaling
            .extract_params()
            .columns
            .keys()
            .cloned()
            .chain(encoding.extract_params().output_names())
            .collect();
        if expected != params.feature_names {
            return Err(PreprocessingError::InvalidParameter(
                "feature names do not match the fitted stages".to_string(),
            ));
        }

        let imputation = FittedImputation::from_params(params.imputation)?;
        if imputation.schema() != &params.schema {
            return Err(PreprocessingError::InvalidParameter(
                "imputation schema does not match the pipeline schema".to_string(),
            ));
        }
        if params.target.is_some() != params.schema.target().is_some() {
            return Err(PreprocessingError::InvalidParameter(
                "target encoder does not match the schema's target column".to_string(),
            ));
        }

        Ok(Self {
            schema: params.schema,
            imputation,
            clipping: params.clipping.map(FittedClipper::from_params).transpose()?,
            scaling,
            encoding,
            target: params
                .target
                .map(FittedLabelEncoder::from_params)
                .transpose()?,
            feature_engineering: params.feature_engineering,
            feature_names: params.feature_names,
        })
    }

    /// Encode as an opaque versioned blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PreprocessingError> {
        Ok(SerializableParams::to_bytes(&self.extract_params())?)
    }

    /// Decode a blob produced by [`FittedState::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PreprocessingError> {
        let params = <FittedStateParams as SerializableParams>::from_bytes(bytes)?;
        Self::from_params(params)
    }

    /// Save the fitted state to a file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PreprocessingError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Load a fitted state from a file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PreprocessingError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, RawTable};
    use crate::preprocessing::config::PipelineConfig;
    use crate::preprocessing::pipeline::PreprocessingPipeline;
    use crate::preprocessing::schema::ColumnRole;

    fn fitted() -> FittedState {
        let table = RawTable::new(vec![
            Column::numeric("amount", vec![Some(10.0), None, Some(30.0), Some(40.0)]),
            Column::text("currency", vec![Some("USD"), Some("EUR"), None, Some("USD")]),
            Column::text("fraud", vec![Some("no"), Some("yes"), Some("no"), Some("yes")]),
        ])
        .unwrap();
        let config = PipelineConfig::new("fraud")
            .with_outlier_threshold(Some(3.0))
            .with_rsi_window(Some(4));
        let mut pipeline = PreprocessingPipeline::new(config);
        let state = pipeline.fit(&table).unwrap();
        (*state).clone()
    }

    #[test]
    fn test_output_layout() {
        let state = fitted();
        assert_eq!(
            state.feature_names(),
            &["amount", "currency_EUR", "currency_USD"]
        );
        assert_eq!(
            state.output_names(),
            vec![
                "amount",
                "currency_EUR",
                "currency_USD",
                "moving_average",
                "exponential_moving_average",
                "relative_strength_index",
            ]
        );
        assert_eq!(state.target_classes(), Some(&["no".to_string(), "yes".to_string()][..]));
        assert!(state.clipping().is_some());
    }

    #[test]
    fn test_bytes_round_trip() {
        let state = fitted();
        let bytes = state.to_bytes().unwrap();
        let restored = FittedState::from_bytes(&bytes).unwrap();
        assert_eq!(restored.extract_params(), state.extract_params());
    }

    #[test]
    fn test_file_round_trip() {
        let state = fitted();
        let temp_file = std::env::temp_dir().join("tabprep_state_test.bin");
        state.save_to_file(&temp_file).unwrap();

        let loaded = FittedState::load_from_file(&temp_file).unwrap();
        assert_eq!(loaded.extract_params(), state.extract_params());

        std::fs::remove_file(temp_file).ok();
    }

    #[test]
    fn test_version_mismatch() {
        let mut params = fitted().extract_params();
        params.version = FORMAT_VERSION + 1;
        let bytes = SerializableParams::to_bytes(&params).unwrap();

        assert!(matches!(
            FittedState::from_bytes(&bytes),
            Err(PreprocessingError::SerializationError(_))
        ));
    }

    #[test]
    fn test_inconsistent_feature_names() {
        let mut params = fitted().extract_params();
        params.feature_names.reverse();
        assert!(matches!(
            FittedState::from_params(params),
            Err(PreprocessingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_schema_disagrees_with_imputation() {
        let mut params = fitted().extract_params();
        params.schema = Schema::from_roles(vec![
            ("amount", ColumnRole::Numeric),
            ("currency", ColumnRole::Categorical),
            ("fraud", ColumnRole::Categorical),
        ])
        .unwrap();
        assert!(matches!(
            FittedState::from_params(params),
            Err(PreprocessingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_target_encoder_without_target_column() {
        let mut params = fitted().extract_params();
        params.target = None;
        assert!(matches!(
            FittedState::from_params(params),
            Err(PreprocessingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_truncated_blob() {
        let bytes = fitted().to_bytes().unwrap();
        assert!(matches!(
            FittedState::from_bytes(&bytes[..bytes.len() / 2]),
            Err(PreprocessingError::SerializationError(_))
        ));
    }
}
