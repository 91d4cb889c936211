//! Custom error types for the preprocessing pipeline.
//!
//! This module provides the error hierarchy shared by the dataset registry and
//! every preprocessing stage, using `thiserror`.
//!
//! Errors are serializable so the dashboard can hand them to any front end as
//! a `{ code, message }` pair.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the preprocessing pipeline.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// A configured source file is missing or could not be parsed.
    #[error("Failed to load dataset '{dataset}': {reason}")]
    Load { dataset: String, reason: String },

    /// A layer cannot be moved between two coordinate reference systems.
    #[error("Cannot reproject from {from} to {to}")]
    Projection { from: String, to: String },

    /// Reshape parameters are invalid.
    #[error("Invalid reshape: {0}")]
    InvalidReshape(String),

    /// A missing-value strategy cannot be applied to the data.
    #[error("Cannot apply missing value strategy '{strategy}': {reason}")]
    Strategy { strategy: String, reason: String },

    /// A column could not be converted to its target type.
    #[error("Failed to convert column '{column}' to {target_type}: {reason}")]
    Coercion {
        column: String,
        target_type: String,
        reason: String,
    },

    /// The dataset name is not known to the registry.
    #[error("Dataset '{0}' not found")]
    DatasetNotFound(String),

    /// The dataset is a geospatial layer where a table stage was requested.
    #[error("Dataset '{0}' is not a tabular dataset")]
    NotTabular(String),

    /// No working copy exists yet for the dataset.
    #[error("No working copy for dataset '{0}'; select it first")]
    NoWorkingCopy(String),

    /// Preprocessing has not been completed for the dataset.
    #[error("Dataset '{0}' has not been processed; complete data preprocessing first")]
    NotProcessed(String),

    /// Nothing to revert for the dataset.
    #[error("No earlier state recorded for dataset '{0}'")]
    NothingToRevert(String),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Feature/target selection is inconsistent.
    #[error("Invalid feature selection: {0}")]
    InvalidSelection(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PreprocessingError>,
    },
}

impl PreprocessingError {
    /// Build a load error for a named dataset.
    pub fn load(dataset: impl Into<String>, reason: impl ToString) -> Self {
        PreprocessingError::Load {
            dataset: dataset.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a coercion error for a column and its target type.
    pub fn coercion(
        column: impl Into<String>,
        target_type: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        PreprocessingError::Coercion {
            column: column.into(),
            target_type: target_type.into(),
            reason: reason.to_string(),
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PreprocessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for front-end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Load { .. } => "LOAD_ERROR",
            Self::Projection { .. } => "PROJECTION_ERROR",
            Self::InvalidReshape(_) => "INVALID_RESHAPE",
            Self::Strategy { .. } => "STRATEGY_ERROR",
            Self::Coercion { .. } => "COERCION_ERROR",
            Self::DatasetNotFound(_) => "DATASET_NOT_FOUND",
            Self::NotTabular(_) => "NOT_TABULAR",
            Self::NoWorkingCopy(_) => "NO_WORKING_COPY",
            Self::NotProcessed(_) => "NOT_PROCESSED",
            Self::NothingToRevert(_) => "NOTHING_TO_REVERT",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidSelection(_) => "INVALID_SELECTION",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if the user can correct the input and retry.
    ///
    /// Stage errors leave the working copy untouched, so they are all
    /// recoverable. Load errors only cost the affected dataset.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidReshape(_)
            | Self::Strategy { .. }
            | Self::Coercion { .. }
            | Self::NoWorkingCopy(_)
            | Self::NothingToRevert(_)
            | Self::NotProcessed(_)
            | Self::ColumnNotFound(_)
            | Self::InvalidSelection(_)
            | Self::DatasetNotFound(_)
            | Self::NotTabular(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PreprocessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for preprocessing operations.
pub type Result<T> = std::result::Result<T, PreprocessingError>;

/// Extension trait for adding context to Polars results.
pub trait ResultExt<T> {
    /// Convert the error and add context to it.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PreprocessingError::Polars(e).with_context(context))
    }
}
