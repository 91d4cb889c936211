//! Error types for the climate-learning crate.
//!
//! This module defines [`LearningError`], the error type returned by every
//! public function in the crate.
//!
//! # Example
//!
//! ```no_run
//! use climate_learning::{Algorithm, LearningError, TrainingConfig};
//!
//! fn config() -> Result<TrainingConfig, LearningError> {
//!     TrainingConfig::builder()
//!         .algorithm(Algorithm::DecisionTree)
//!         .test_size(0.25)
//!         .build()
//! }
//! ```

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for climate-learning operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LearningError {
    /// Invalid configuration provided to the trainer.
    ///
    /// The message names the offending setting and its accepted range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data provided for training.
    ///
    /// Common causes:
    /// - A feature or target column holds missing values
    /// - A feature or target column is not numeric
    /// - Too few rows to produce both a training and a test split
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The target column was not found in the DataFrame.
    #[error("Target column '{0}' not found")]
    TargetNotFound(String),

    /// A feature column was not found in the DataFrame.
    #[error("Feature column '{0}' not found")]
    FeatureNotFound(String),

    /// The model could not be fitted.
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// No model artifact exists at the expected location.
    ///
    /// Train a model first; the artifact is written on every successful run.
    #[error("No trained model found at {path}; train a model first")]
    ModelNotFound {
        /// The path that was not found.
        path: String,
    },

    /// An error occurred during prediction.
    #[error("Inference error: {0}")]
    InferenceError(String),

    /// I/O error while reading or writing the model artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The model artifact could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Polars error while reading feature columns.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl LearningError {
    /// Get error code for front-end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::TargetNotFound(_) => "TARGET_NOT_FOUND",
            Self::FeatureNotFound(_) => "FEATURE_NOT_FOUND",
            Self::TrainingFailed(_) => "TRAINING_FAILED",
            Self::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            Self::InferenceError(_) => "INFERENCE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
        }
    }

    /// Check if the user can fix the input and retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_)
                | Self::InvalidData(_)
                | Self::TargetNotFound(_)
                | Self::FeatureNotFound(_)
                | Self::ModelNotFound { .. }
                | Self::InferenceError(_)
        )
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for LearningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("LearningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for learning operations.
pub type Result<T> = std::result::Result<T, LearningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            LearningError::ModelNotFound {
                path: "trained_model.json".to_string()
            }
            .error_code(),
            "MODEL_NOT_FOUND"
        );
        assert_eq!(
            LearningError::InvalidData("nulls".to_string()).error_code(),
            "INVALID_DATA"
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(LearningError::TargetNotFound("Temp".to_string()).is_recoverable());
        assert!(!LearningError::TrainingFailed("singular".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_serialization() {
        let error = LearningError::ModelNotFound {
            path: "models/trained_model.json".to_string(),
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["code"], "MODEL_NOT_FOUND");
        assert!(json["message"].as_str().unwrap().contains("train a model first"));
    }
}
