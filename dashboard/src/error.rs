//! Errors returned by dashboard commands.
//!
//! Library errors pass through unchanged so their codes reach the caller.
//! Like the library errors, a [`CommandError`] serializes as `{ code, message }`.

use climate_learning::LearningError;
use climate_processing::PreprocessingError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),

    #[error(transparent)]
    Learning(#[from] LearningError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Analysis and modeling pages need at least one processed dataset.
    #[error("No processed dataset available; please complete data preprocessing first")]
    NoProcessedData,

    /// Training was requested before feature and target columns were picked.
    #[error("No feature selection; select feature and target columns first")]
    NoFeatureSelection,

    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Invalid script: {0}")]
    Script(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl CommandError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Preprocessing(err) => err.error_code(),
            Self::Learning(err) => err.error_code(),
            Self::Config(_) => "INVALID_CONFIG",
            Self::NoProcessedData => "NO_PROCESSED_DATA",
            Self::NoFeatureSelection => "NO_FEATURE_SELECTION",
            Self::Analysis(_) => "ANALYSIS_ERROR",
            Self::Script(_) => "SCRIPT_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
        }
    }

    /// Whether the user can fix the input and try the same command again.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Preprocessing(err) => err.is_recoverable(),
            Self::Learning(err) => err.is_recoverable(),
            Self::NoProcessedData | Self::NoFeatureSelection | Self::Analysis(_) => true,
            _ => false,
        }
    }
}

impl Serialize for CommandError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CommandError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type CommandResult<T> = std::result::Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_library_codes_pass_through() {
        let err = CommandError::from(PreprocessingError::NotProcessed("Climate".to_string()));
        assert_eq!(err.error_code(), "NOT_PROCESSED");
        assert!(err.is_recoverable());

        let err = CommandError::from(LearningError::ModelNotFound {
            path: "models/trained_model.json".to_string(),
        });
        assert_eq!(err.error_code(), "MODEL_NOT_FOUND");
    }

    #[test]
    fn test_serializes_code_and_message() {
        let json = serde_json::to_value(CommandError::NoProcessedData).unwrap();
        assert_eq!(json["code"], "NO_PROCESSED_DATA");
        assert!(
            json["message"]
                .as_str()
                .unwrap()
                .contains("complete data preprocessing first")
        );
    }
}
