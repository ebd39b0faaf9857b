//! Error types for the diabetes triage service

use thiserror::Error;

/// Result type alias for triage operations
pub type Result<T> = std::result::Result<T, TriageError>;

/// Main error type for the triage service
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Dataset unavailable: {0}")]
    DatasetUnavailable(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for TriageError {
    fn from(err: polars::error::PolarsError) -> Self {
        TriageError::DatasetUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for TriageError {
    fn from(err: serde_json::Error) -> Self {
        TriageError::PersistenceError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TriageError {
    fn from(err: ndarray::ShapeError) -> Self {
        TriageError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TriageError::InvalidConfiguration("test_size must be in (0, 1)".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: test_size must be in (0, 1)"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TriageError = io_err.into();
        assert!(matches!(err, TriageError::IoError(_)));
    }
}
