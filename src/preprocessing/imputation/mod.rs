//! Imputation of missing values.
//!
//! # Available Transformers
//!
//! | Transformer | Description |
//! |-------------|-------------|
//! | [`ImputationStage`] | Median / mean / constant for numeric columns, most frequent / constant for categorical ones |

pub mod simple;

pub use simple::{
    CategoricalStrategy, FittedImputation, ImputationParams, ImputationStage, NumericStrategy,
};
