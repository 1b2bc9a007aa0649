//! Label encoding for the target column.
//!
//! Maps class labels to dense indices `0..k` in sorted-label order.

use crate::preprocessing::error::PreprocessingError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Label encoder for target labels.
///
/// Numeric targets are labelled by their shortest decimal form before they
/// reach the encoder, so `0.0` and `"0"` name the same class.
///
/// Classes are ordered as strings, numeric labels included: `"10"` sorts
/// before `"2"`, so its index is smaller. Use
/// [`FittedLabelEncoder::classes`] to map indices back to labels rather than
/// assuming numeric order.
///
/// # Example
/// ```ignore
/// use tabprep::preprocessing::LabelEncoder;
///
/// let fitted = LabelEncoder::new().fit(&["fraud", "ok", "ok"])?;
/// assert_eq!(fitted.transform(&["ok", "fraud"])?, vec![1, 0]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct LabelEncoder;

impl LabelEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Fit the encoder to the labels and return the fitted encoder.
    pub fn fit<L: AsRef<str>>(&self, labels: &[L]) -> Result<FittedLabelEncoder, PreprocessingError> {
        if labels.is_empty() {
            return Err(PreprocessingError::EmptyDataset(
                "Cannot fit LabelEncoder on empty labels".to_string(),
            ));
        }

        let classes: BTreeSet<&str> = labels.iter().map(AsRef::as_ref).collect();
        FittedLabelEncoder::from_params(LabelEncoderParams {
            classes: classes.into_iter().map(str::to_string).collect(),
        })
    }

    /// Fit and transform in one step.
    pub fn fit_transform<L: AsRef<str>>(&self, labels: &[L]) -> Result<Vec<usize>, PreprocessingError> {
        let fitted = self.fit(labels)?;
        fitted.transform(labels)
    }
}

/// Serializable parameters for a fitted LabelEncoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoderParams {
    /// Unique classes in sorted order.
    pub classes: Vec<String>,
}

/// Fitted LabelEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedLabelEncoder {
    classes: Vec<String>,
    class_to_idx: HashMap<String, usize>,
}

impl FittedLabelEncoder {
    /// Get the unique classes, sorted.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Transform labels to class indices.
    ///
    /// # Errors
    /// Returns [`PreprocessingError::UnknownClass`] for a label not seen during fit.
    pub fn transform<L: AsRef<str>>(&self, labels: &[L]) -> Result<Vec<usize>, PreprocessingError> {
        labels
            .iter()
            .map(|label| {
                let label = label.as_ref();
                self.class_to_idx
                    .get(label)
                    .copied()
                    .ok_or_else(|| PreprocessingError::UnknownClass(label.to_string()))
            })
            .collect()
    }

    /// Map class indices back to labels.
    pub fn inverse_transform(&self, indices: &[usize]) -> Result<Vec<String>, PreprocessingError> {
        indices
            .iter()
            .map(|&idx| {
                self.classes.get(idx).cloned().ok_or_else(|| {
                    PreprocessingError::InvalidParameter(format!(
                        "Index {} out of bounds for {} classes",
                        idx,
                        self.classes.len()
                    ))
                })
            })
            .collect()
    }

    /// Extract parameters for serialization.
    pub fn extract_params(&self) -> LabelEncoderParams {
        LabelEncoderParams {
            classes: self.classes.clone(),
        }
    }

    /// Reconstruct from parameters.
    pub fn from_params(params: LabelEncoderParams) -> Result<Self, PreprocessingError> {
        if !params.classes.windows(2).all(|w| w[0] < w[1]) {
            return Err(PreprocessingError::InvalidParameter(
                "LabelEncoder classes must be sorted and unique".to_string(),
            ));
        }
        let class_to_idx = params
            .classes
            .iter()
            .enumerate()
            .map(|(idx, class)| (class.clone(), idx))
            .collect();
        Ok(Self {
            classes: params.classes,
            class_to_idx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_encoder_basic() {
        let fitted = LabelEncoder::new().fit(&["2", "0", "1", "0"]).unwrap();
        assert_eq!(fitted.classes(), &["0", "1", "2"]);
        assert_eq!(fitted.n_classes(), 3);
        assert_eq!(fitted.transform(&["2", "0", "1", "0"]).unwrap(), vec![2, 0, 1, 0]);
    }

    #[test]
    fn test_numeric_labels_use_string_order() {
        let fitted = LabelEncoder::new().fit(&["2", "10", "1"]).unwrap();
        assert_eq!(fitted.classes(), &["1", "10", "2"]);
        assert_eq!(fitted.transform(&["10", "2"]).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_label_encoder_text_classes() {
        let encoded = LabelEncoder::new()
            .fit_transform(&["ok", "fraud", "ok"])
            .unwrap();
        assert_eq!(encoded, vec![1, 0, 1]);
    }

    #[test]
    fn test_label_encoder_inverse() {
        let fitted = LabelEncoder::new().fit(&["b", "a"]).unwrap();
        assert_eq!(fitted.inverse_transform(&[1, 0]).unwrap(), vec!["b", "a"]);
        assert!(matches!(
            fitted.inverse_transform(&[2]),
            Err(PreprocessingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_label_encoder_unknown() {
        let fitted = LabelEncoder::new().fit(&["0", "1"]).unwrap();
        assert!(matches!(
            fitted.transform(&["5"]),
            Err(PreprocessingError::UnknownClass(ref l)) if l == "5"
        ));
    }

    #[test]
    fn test_label_encoder_empty() {
        let labels: [&str; 0] = [];
        assert!(matches!(
            LabelEncoder::new().fit(&labels),
            Err(PreprocessingError::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_label_encoder_params_round_trip() {
        let fitted = LabelEncoder::new().fit(&["y", "x"]).unwrap();
        let restored = FittedLabelEncoder::from_params(fitted.extract_params()).unwrap();
        assert_eq!(restored.transform(&["x", "y"]).unwrap(), vec![0, 1]);

        let unsorted = LabelEncoderParams {
            classes: vec!["b".to_string(), "a".to_string()],
        };
        assert!(FittedLabelEncoder::from_params(unsorted).is_err());
    }
}
