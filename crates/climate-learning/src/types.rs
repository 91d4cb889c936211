//! Common types returned by training and prediction.
//!
//! - [`TrainingResult`]: returned by [`Pipeline::train()`](crate::Pipeline::train)
//! - [`Metrics`]: test-split evaluation
//! - [`PredictionResult`]: returned by [`TrainedModel::predict()`](crate::TrainedModel::predict)
//! - [`ModelInfo`]: metadata about a saved model

use serde::{Deserialize, Serialize};

use crate::config::Algorithm;

/// Number of actual/predicted pairs kept in a [`TrainingResult`].
pub const PREVIEW_ROWS: usize = 5;

/// Regression metrics on the held-out test split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Coefficient of determination. 1.0 is a perfect fit; negative values
    /// are worse than predicting the mean.
    pub r2: f64,

    /// Root mean squared error, in target units.
    pub rmse: f64,

    /// Mean absolute error, in target units.
    pub mae: f64,
}

/// One test row's actual and predicted target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionPair {
    pub actual: f64,
    pub predicted: f64,
}

/// Result of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Algorithm that was fitted.
    pub algorithm: Algorithm,

    /// Feature columns, in the order the model expects them.
    pub feature_names: Vec<String>,

    /// Target column.
    pub target: String,

    /// Rows used for fitting.
    pub train_rows: usize,

    /// Rows held out for evaluation.
    pub test_rows: usize,

    /// Metrics on the test split.
    pub metrics: Metrics,

    /// First test rows, actual against predicted.
    pub preview: Vec<PredictionPair>,

    /// Non-fatal issues found while fitting.
    pub warnings: Vec<String>,
}

/// Result of a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Target column the value predicts.
    pub target: String,

    /// The predicted value.
    pub prediction: f64,

    /// Feature values used, in model order, after defaults were applied.
    pub inputs: Vec<(String, f64)>,
}

/// Information about a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub algorithm: Algorithm,
    pub target: String,
    pub feature_names: Vec<String>,
    pub metrics: Metrics,
}
