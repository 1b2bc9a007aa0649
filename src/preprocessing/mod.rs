//! Leak-free preprocessing for tabular classification data.
//!
//! Every stage follows the same two-phase contract: an unfitted stage holds
//! hyperparameters only, `fit` learns statistics from training rows, and the
//! fitted stage applies them unchanged to any later table.
//!
//! # Core Traits
//!
//! - [`Transformer`]: Unfitted stage with hyperparameters
//! - [`FittedTransformer`]: Fitted stage ready for transform, persistable as params
//!
//! # Stages
//!
//! - [`SchemaInspector`]: Classify columns as numeric, categorical or target
//! - [`ImputationStage`]: Fill missing cells with median, mean, mode or a constant
//! - [`OutlierClipper`]: Optionally clip numeric values to `mean ± k·std`
//! - [`ScalingStage`]: Z-score normalization, constant columns map to zero
//! - [`EncodingStage`]: One-hot indicators, unseen levels map to all zeros
//! - [`LabelEncoder`]: Target labels to class indices
//! - [`FeatureEngineeringStage`]: Rolling aggregates over the original row order
//!
//! ## Pipeline
//! - [`PreprocessingPipeline`]: Fit on train rows, transform anything, prepare partitions
//!
//! # Example
//!
//! ```ignore
//! use tabprep::dataset::RawTable;
//! use tabprep::preprocessing::{PipelineConfig, PreprocessingPipeline};
//!
//! let raw = RawTable::from_csv_path("transactions.csv")?;
//! let mut pipeline = PreprocessingPipeline::new(PipelineConfig::new("fraud"));
//! let prepared = pipeline.prepare(&raw)?;
//!
//! // Persist the fitted state for later inference
//! prepared.state.save_to_file("state.bin")?;
//! ```

pub mod config;
pub mod diagnostics;
pub mod encoding;
pub mod error;
pub mod feature_engineering;
pub mod frame;
pub mod imputation;
pub mod pipeline;
pub mod scaling;
pub mod schema;
pub mod traits;

// Re-export main types
pub use config::PipelineConfig;
pub use diagnostics::{CollectingSink, DiagnosticSink, LogSink, NullSink, PipelineEvent};
pub use encoding::{
    EncodingParams, EncodingStage, FittedEncoding, FittedLabelEncoder, LabelEncoder,
    LabelEncoderParams,
};
pub use error::PreprocessingError;
pub use feature_engineering::FeatureEngineeringStage;
pub use frame::{FeatureMatrix, ImputedTable};
pub use imputation::{
    CategoricalStrategy, FittedImputation, ImputationParams, ImputationStage, NumericStrategy,
};
pub use pipeline::{
    FittedState, FittedStateParams, Partition, PreparedDataset, PreprocessingPipeline,
    TargetVector,
};
pub use scaling::{
    ClipParams, ColumnScale, FittedClipper, FittedScaling, OutlierClipper, ScaleParams,
    ScalingStage,
};
pub use schema::{ColumnRole, Schema, SchemaInspector};
pub use traits::{FittedTransformer, Transformer};
