//! Pipeline orchestrator.
//!
//! The orchestrator composes the stages into the fit/transform contract:
//!
//! ```text
//! fit:        RawTable -> schema -> impute -> (clip) -> {scale, encode}   [train rows only]
//! transform:  RawTable -> impute -> (clip) -> scale || encode -> FeatureMatrix
//! engineer:   FeatureMatrix -> FeatureMatrix + rolling columns            [original row order]
//! ```
//!
//! [`PreprocessingPipeline::prepare`] runs the whole canonical flow: split
//! indices are computed from the target first, every stage is fitted on the
//! training rows, the full table is transformed and engineered in its
//! original order, and only then are rows partitioned.

use crate::dataset::{RawTable, Split, StratifiedSplitter};
use crate::preprocessing::config::PipelineConfig;
use crate::preprocessing::diagnostics::{DiagnosticSink, NullSink, PipelineEvent};
use crate::preprocessing::encoding::{EncodingStage, LabelEncoder};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::frame::FeatureMatrix;
use crate::preprocessing::imputation::ImputationStage;
use crate::preprocessing::pipeline::state::FittedState;
use crate::preprocessing::scaling::{OutlierClipper, ScalingStage};
use crate::preprocessing::schema::SchemaInspector;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::Array1;
use std::sync::Arc;

/// Encoded target column.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetVector {
    indices: Vec<usize>,
    classes: Vec<String>,
}

impl TargetVector {
    /// Class index per row.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Class labels in index order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Label of each row.
    pub fn labels(&self) -> Vec<&str> {
        self.indices
            .iter()
            .map(|&i| self.classes[i].as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn to_array(&self) -> Array1<usize> {
        Array1::from_vec(self.indices.clone())
    }

    /// Keep only the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Result<Self, PreprocessingError> {
        let indices = rows
            .iter()
            .map(|&r| {
                self.indices
                    .get(r)
                    .copied()
                    .ok_or_else(|| PreprocessingError::InvalidShape {
                        expected: format!("row index < {}", self.indices.len()),
                        got: format!("row index {}", r),
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            indices,
            classes: self.classes.clone(),
        })
    }
}

/// One side of a prepared dataset.
#[derive(Clone, Debug)]
pub struct Partition {
    pub features: FeatureMatrix,
    pub target: TargetVector,
}

/// Model-ready train and test partitions.
#[derive(Clone, Debug)]
pub struct PreparedDataset {
    pub train: Partition,
    pub test: Partition,
    /// Row indices of each partition in the input table.
    pub split: Split,
    /// State every partition was transformed with.
    pub state: Arc<FittedState>,
}

/// Preprocessing pipeline.
///
/// Starts unfitted; `fit` moves it to the fitted state, and every later `fit`
/// replaces that state with a wholly new one. The fitted state is shared
/// behind an `Arc`, so `transform` may be called from many threads at once.
///
/// # Example
/// ```ignore
/// use tabprep::preprocessing::{PipelineConfig, PreprocessingPipeline};
///
/// let mut pipeline = PreprocessingPipeline::new(PipelineConfig::new("fraud"));
/// let prepared = pipeline.prepare(&raw)?;
/// let x_train = prepared.train.features.values();
/// let y_train = prepared.train.target.to_array();
/// ```
pub struct PreprocessingPipeline {
    config: PipelineConfig,
    sink: Arc<dyn DiagnosticSink>,
    state: Option<Arc<FittedState>>,
}

impl std::fmt::Debug for PreprocessingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreprocessingPipeline")
            .field("config", &self.config)
            .field("fitted", &self.state.is_some())
            .finish()
    }
}

impl PreprocessingPipeline {
    /// Create an unfitted pipeline that drops diagnostics.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            sink: Arc::new(NullSink),
            state: None,
        }
    }

    /// Rebuild a fitted pipeline from a previously persisted state.
    pub fn from_state(
        config: PipelineConfig,
        state: FittedState,
    ) -> Result<Self, PreprocessingError> {
        config.validate()?;
        Ok(Self {
            config,
            sink: Arc::new(NullSink),
            state: Some(Arc::new(state)),
        })
    }

    /// Send diagnostics to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// The current fitted state.
    ///
    /// # Errors
    /// Returns [`PreprocessingError::NotFitted`] before the first `fit`.
    pub fn fitted_state(&self) -> Result<Arc<FittedState>, PreprocessingError> {
        self.state.clone().ok_or(PreprocessingError::NotFitted)
    }

    /// Learn every stage's parameters from `train`.
    ///
    /// On error the previous state, if any, is left untouched.
    pub fn fit(&mut self, train: &RawTable) -> Result<Arc<FittedState>, PreprocessingError> {
        let state = Arc::new(self.fit_state(train)?);
        self.state = Some(Arc::clone(&state));
        Ok(state)
    }

    fn fit_state(&self, train: &RawTable) -> Result<FittedState, PreprocessingError> {
        self.config.validate()?;
        if train.is_empty() {
            return Err(PreprocessingError::EmptyDataset(
                "Cannot fit the pipeline on an empty table".to_string(),
            ));
        }

        let schema = SchemaInspector::new().inspect(train, self.config.target.as_deref())?;
        self.sink.record(PipelineEvent::SchemaInferred {
            numeric: schema.numeric_columns().len(),
            categorical: schema.categorical_columns().len(),
            target: schema.target().map(str::to_string),
        });

        let imputation = ImputationStage::new()
            .with_numeric_strategy(self.config.numeric_strategy.clone())
            .with_categorical_strategy(self.config.categorical_strategy.clone())
            .fit(train, &schema)?;
        self.stage_fitted("imputation", imputation.n_features_in());
        let mut imputed = imputation.transform(train, &NullSink)?;

        let clipping = match self.config.outlier_threshold {
            Some(threshold) => {
                let clipper = OutlierClipper::new(threshold).fit(&imputed, &schema)?;
                self.stage_fitted("clipping", clipper.n_features_in());
                imputed = clipper.transform(&imputed, &NullSink)?;
                Some(clipper)
            }
            None => None,
        };

        let scaling = ScalingStage::new().fit(&imputed, &schema)?;
        self.stage_fitted("scaling", scaling.n_features_in());
        for column in scaling.degenerate_columns() {
            self.sink.record(PipelineEvent::DegenerateColumn {
                column: column.to_string(),
            });
        }

        let encoding = EncodingStage::new().fit(&imputed, &schema)?;
        self.stage_fitted("encoding", encoding.n_features_in());

        let target = match schema.target() {
            Some(name) => {
                let labels = train.target_labels(name)?;
                Some(LabelEncoder::new().fit(&labels)?)
            }
            None => None,
        };

        let feature_names: Vec<String> = schema
            .numeric_columns()
            .into_iter()
            .map(str::to_string)
            .chain(encoding.extract_params().output_names())
            .collect();

        let feature_engineering = self.config.feature_engineering();
        if let Some(taken) = feature_engineering
            .output_names()
            .into_iter()
            .find(|name| feature_names.contains(name))
        {
            return Err(PreprocessingError::Schema(format!(
                "feature column '{}' collides with an engineered column",
                taken
            )));
        }

        Ok(FittedState {
            schema,
            imputation,
            clipping,
            scaling,
            encoding,
            target,
            feature_engineering,
            feature_names,
        })
    }

    fn stage_fitted(&self, stage: &'static str, columns: usize) {
        self.sink
            .record(PipelineEvent::StageFitted { stage, columns });
    }

    /// Apply the fitted stages to any table with the fitted feature columns.
    ///
    /// Never recomputes statistics from `table`.
    ///
    /// # Errors
    /// - [`PreprocessingError::NotFitted`] before the first `fit`
    /// - [`PreprocessingError::SchemaMismatch`] if the feature columns differ
    pub fn transform(&self, table: &RawTable) -> Result<FeatureMatrix, PreprocessingError> {
        let state = self.fitted_state()?;
        let sink: &dyn DiagnosticSink = &*self.sink;

        let mut imputed = state.imputation.transform(table, sink)?;
        if let Some(clipper) = &state.clipping {
            imputed = clipper.transform(&imputed, sink)?;
        }

        let (scaled, encoded) = rayon::join(
            || state.scaling.transform(&imputed, sink),
            || state.encoding.transform(&imputed, sink),
        );
        let features = scaled?.hstack(&encoded?)?;

        self.sink.record(PipelineEvent::TransformCompleted {
            rows: features.n_rows(),
            columns: features.n_columns(),
        });
        Ok(features)
    }

    /// `fit` followed by `transform` on the same table.
    pub fn fit_transform(&mut self, table: &RawTable) -> Result<FeatureMatrix, PreprocessingError> {
        self.fit(table)?;
        self.transform(table)
    }

    /// Append the rolling features to a transformed matrix.
    ///
    /// `matrix` must hold the full table in original row order.
    pub fn engineer(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix, PreprocessingError> {
        let state = self.fitted_state()?;
        state
            .feature_engineering
            .apply(matrix, &state.schema.numeric_columns())
    }

    /// Encode the target column of `table` with the fitted label encoder.
    ///
    /// # Errors
    /// - [`PreprocessingError::NotFitted`] before the first `fit`
    /// - [`PreprocessingError::Schema`] if no target was fitted or `table` lacks it
    /// - [`PreprocessingError::UnknownClass`] for a label not seen during fit
    pub fn transform_target(&self, table: &RawTable) -> Result<TargetVector, PreprocessingError> {
        let state = self.fitted_state()?;
        let (name, encoder) = match (state.schema.target(), &state.target) {
            (Some(name), Some(encoder)) => (name, encoder),
            _ => {
                return Err(PreprocessingError::Schema(
                    "pipeline was fitted without a target column".to_string(),
                ))
            }
        };

        let labels = table.target_labels(name)?;
        Ok(TargetVector {
            indices: encoder.transform(&labels)?,
            classes: encoder.classes().to_vec(),
        })
    }

    /// Run the full flow on a raw table: split, fit on train rows, transform
    /// and engineer in original order, then partition.
    pub fn prepare(&mut self, raw: &RawTable) -> Result<PreparedDataset, PreprocessingError> {
        self.config.validate()?;
        let target = self.config.target.clone().ok_or_else(|| {
            PreprocessingError::InvalidParameter(
                "prepare requires a target column in the configuration".to_string(),
            )
        })?;

        let labels = raw.target_labels(&target)?;
        let split = StratifiedSplitter::new(self.config.test_fraction, self.config.seed)
            .split(&labels)?;
        self.sink.record(PipelineEvent::SplitComputed {
            train: split.train().len(),
            test: split.test().len(),
        });

        let state = self.fit(&raw.select_rows(split.train())?)?;
        let features = self.engineer(&self.transform(raw)?)?;
        let target = self.transform_target(raw)?;

        Ok(PreparedDataset {
            train: Partition {
                features: features.select_rows(split.train())?,
                target: target.select_rows(split.train())?,
            },
            test: Partition {
                features: features.select_rows(split.test())?,
                target: target.select_rows(split.test())?,
            },
            split,
            state,
        })
    }
}
