//! Error types for preprocessing operations.

use std::fmt;

/// Error type for preprocessing operations.
///
/// Every variant is a structural failure that the pipeline never papers over
/// with a default. The two documented fallbacks (unseen categories and
/// zero-variance columns) are not errors and never produce one of these.
#[derive(Debug)]
pub enum PreprocessingError {
    /// Column typing is inconsistent, names collide, or a required target is missing.
    Schema(String),
    /// A column has no observed values in the data used for fitting.
    EmptyColumn { column: String },
    /// No rows were supplied where statistics had to be computed.
    EmptyDataset(String),
    /// `transform` was called before `fit`.
    NotFitted,
    /// The table handed to a fitted stage does not match the fitted schema.
    SchemaMismatch { expected: String, got: String },
    /// A target class has too few rows to appear on both sides of a split.
    InsufficientClassSamples { class: String, count: usize },
    /// A target label was not seen when the label encoder was fitted.
    UnknownClass(String),
    /// Invalid configuration or hyperparameter value.
    InvalidParameter(String),
    /// Ragged or otherwise malformed table shape.
    InvalidShape { expected: String, got: String },
    /// Serialization or deserialization error.
    SerializationError(String),
    /// I/O error during file operations.
    IoError(String),
    /// Malformed delimited input.
    CsvError(String),
}

impl fmt::Display for PreprocessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreprocessingError::Schema(msg) => {
                write!(f, "Schema error: {}", msg)
            }
            PreprocessingError::EmptyColumn { column } => {
                write!(f, "Empty column: '{}' has no observed values", column)
            }
            PreprocessingError::EmptyDataset(msg) => {
                write!(f, "Empty dataset: {}", msg)
            }
            PreprocessingError::NotFitted => {
                write!(f, "Pipeline is not fitted: call fit before transform")
            }
            PreprocessingError::SchemaMismatch { expected, got } => {
                write!(f, "Schema mismatch: expected {}, got {}", expected, got)
            }
            PreprocessingError::InsufficientClassSamples { class, count } => {
                write!(
                    f,
                    "Insufficient class samples: class '{}' has {} row(s), need at least 2",
                    class, count
                )
            }
            PreprocessingError::UnknownClass(label) => {
                write!(f, "Unknown class: '{}' was not seen during fit", label)
            }
            PreprocessingError::InvalidParameter(msg) => {
                write!(f, "Invalid parameter: {}", msg)
            }
            PreprocessingError::InvalidShape { expected, got } => {
                write!(f, "Invalid shape: expected {}, got {}", expected, got)
            }
            PreprocessingError::SerializationError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            PreprocessingError::IoError(msg) => {
                write!(f, "I/O error: {}", msg)
            }
            PreprocessingError::CsvError(msg) => {
                write!(f, "CSV error: {}", msg)
            }
        }
    }
}

impl std::error::Error for PreprocessingError {}

impl From<std::io::Error> for PreprocessingError {
    fn from(err: std::io::Error) -> Self {
        PreprocessingError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for PreprocessingError {
    fn from(err: bincode::Error) -> Self {
        PreprocessingError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for PreprocessingError {
    fn from(err: serde_json::Error) -> Self {
        PreprocessingError::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for PreprocessingError {
    fn from(err: csv::Error) -> Self {
        PreprocessingError::CsvError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_schema() {
        let err = PreprocessingError::Schema("mixed kinds".to_string());
        assert!(err.to_string().contains("Schema error"));
    }

    #[test]
    fn test_error_display_empty_column() {
        let err = PreprocessingError::EmptyColumn {
            column: "amount".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Empty column"));
        assert!(msg.contains("amount"));
    }

    #[test]
    fn test_error_display_not_fitted() {
        let err = PreprocessingError::NotFitted;
        assert!(err.to_string().contains("not fitted"));
    }

    #[test]
    fn test_error_display_schema_mismatch() {
        let err = PreprocessingError::SchemaMismatch {
            expected: "[a, b]".to_string(),
            got: "[a]".to_string(),
        };
        assert!(err.to_string().contains("Schema mismatch"));
    }

    #[test]
    fn test_error_display_insufficient_class_samples() {
        let err = PreprocessingError::InsufficientClassSamples {
            class: "1".to_string(),
            count: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("Insufficient class samples"));
        assert!(msg.contains("'1'"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: PreprocessingError = io_err.into();
        assert!(matches!(err, PreprocessingError::IoError(_)));
    }

    #[test]
    fn test_error_from_json_error() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: PreprocessingError = json_err.into();
        assert!(matches!(err, PreprocessingError::SerializationError(_)));
    }

    #[test]
    fn test_error_from_bincode_error() {
        let bad_bytes: &[u8] = &[0xff, 0xff, 0xff, 0xff];
        let bincode_result: Result<String, bincode::Error> = bincode::deserialize(bad_bytes);
        if let Err(e) = bincode_result {
            let err: PreprocessingError = e.into();
            assert!(matches!(err, PreprocessingError::SerializationError(_)));
        }
    }

    #[test]
    fn test_error_is_std_error() {
        let err = PreprocessingError::InvalidParameter("test".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
