//! Numeric column transformers.
//!
//! # Available Transformers
//!
//! | Transformer | Description | Use Case |
//! |-------------|-------------|----------|
//! | [`ScalingStage`] | Z-score normalization (mean=0, std=1) | Every numeric feature |
//! | [`OutlierClipper`] | Clamp to `mean ± threshold·std` | Heavy-tailed amounts, optional |

pub mod clip;
pub mod standard;

pub use clip::{ClipBounds, ClipParams, FittedClipper, OutlierClipper};
pub use standard::{ColumnScale, FittedScaling, ScaleParams, ScalingStage};
