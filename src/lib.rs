//! # tabprep
//!
//! Leak-free preprocessing and feature engineering for tabular classification
//! data, with a strict separation between fitting and transforming.
//!
//! ## Core Design Principles
//!
//! - **Fit on train only**: Every statistic (fill values, means, standard
//!   deviations, category levels, class labels) is learned from training rows
//!   and reused unchanged on validation, test and inference tables.
//! - **Immutable fitted state**: A fit produces one read-only
//!   [`FittedState`](preprocessing::FittedState) shared behind an `Arc`, so
//!   concurrent transforms need no locking.
//! - **Plain-data persistence**: Fitted stages convert to serde params and
//!   round-trip through a versioned binary blob.
//! - **Caller-owned diagnostics**: Stages report structured events to a
//!   [`DiagnosticSink`](preprocessing::DiagnosticSink) instead of printing.
//!
//! ## Quick Start
//!
//! ```rust
//! use tabprep::dataset::{Column, RawTable};
//! use tabprep::preprocessing::{PipelineConfig, PreprocessingPipeline};
//!
//! let raw = RawTable::new(vec![
//!     Column::numeric("amount", vec![Some(10.0), Some(20.0), None, Some(40.0), Some(50.0)]),
//!     Column::text("channel", vec![Some("web"), Some("pos"), Some("web"), None, Some("web")]),
//!     Column::numeric("fraud", vec![Some(0.0), Some(1.0), Some(0.0), Some(1.0), Some(0.0)]),
//! ])
//! .unwrap();
//!
//! let config = PipelineConfig::new("fraud").with_test_fraction(0.4);
//! let mut pipeline = PreprocessingPipeline::new(config);
//! let prepared = pipeline.prepare(&raw).unwrap();
//!
//! assert_eq!(prepared.test.features.n_rows(), 2);
//! assert_eq!(
//!     prepared.train.features.column_names(),
//!     prepared.test.features.column_names()
//! );
//! ```
//!
//! ## Module Structure
//!
//! - `dataset`: Raw tables, CSV ingestion and the stratified splitter
//! - `preprocessing`: Stages, configuration, diagnostics and the pipeline orchestrator
//! - `serialization`: Binary encoding of fitted parameters

pub mod dataset;
pub mod preprocessing;
pub mod serialization;

pub use dataset::{RawTable, StratifiedSplitter};
pub use preprocessing::{PipelineConfig, PreprocessingError, PreprocessingPipeline};
