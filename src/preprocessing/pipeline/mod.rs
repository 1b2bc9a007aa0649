//! Pipeline orchestration and fitted state.
//!
//! [`PreprocessingPipeline`] drives the stages in a fixed order and holds at
//! most one [`FittedState`]. The state is immutable once built: refitting
//! swaps in a new one, and in-flight transforms keep the state they started
//! with.

#[allow(clippy::module_inception)]
mod pipeline;
pub mod state;

pub use pipeline::{Partition, PreparedDataset, PreprocessingPipeline, TargetVector};
pub use state::{FittedState, FittedStateParams, FORMAT_VERSION};
