//! Categorical encoding.
//!
//! # Available Encoders
//!
//! ## EncodingStage
//! Expands each categorical feature column into indicator columns.
//!
//! ```ignore
//! // currency: [USD, EUR, GBP]  (GBP unseen during fit)
//! // currency_EUR, currency_USD: [[0,1], [1,0], [0,0]]
//! ```
//!
//! ## LabelEncoder
//! Encodes target labels to class indices (for classification targets).
//!
//! # Design Notes
//!
//! Levels are plain strings and always sorted, so the output layout depends
//! only on the set of training levels, never on the order rows arrive in.

mod label;
mod one_hot;

pub use label::{FittedLabelEncoder, LabelEncoder, LabelEncoderParams};
pub use one_hot::{indicator_name, EncodingParams, EncodingStage, FittedEncoding};
