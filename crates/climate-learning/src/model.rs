//! Trained model artifact for prediction and persistence.
//!
//! A [`TrainedModel`] bundles the fitted algorithm with the feature order it
//! expects, the target it predicts and its test metrics. It is saved as JSON
//! under the fixed name [`MODEL_FILE_NAME`], so there is one current model
//! per model directory and each training run replaces it.
//!
//! # Example
//!
//! ```rust,ignore
//! use climate_learning::TrainedModel;
//! use std::collections::HashMap;
//!
//! let model = TrainedModel::load_from_dir("models")?;
//! let inputs = HashMap::from([("Rainfall".to_string(), 120.0)]);
//! let result = model.predict(&inputs)?;
//! println!("{} = {}", result.target, result.prediction);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::algorithms::FittedModel;
use crate::config::Algorithm;
use crate::error::{LearningError, Result};
use crate::types::{Metrics, ModelInfo, PredictionResult};

/// File name of the saved model inside a model directory.
pub const MODEL_FILE_NAME: &str = "trained_model.json";

/// A trained regression model ready for inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    feature_names: Vec<String>,
    target: String,
    metrics: Metrics,
    model: FittedModel,
}

impl TrainedModel {
    pub(crate) fn new(
        feature_names: Vec<String>,
        target: String,
        metrics: Metrics,
        model: FittedModel,
    ) -> Self {
        Self {
            feature_names,
            target,
            metrics,
            model,
        }
    }

    /// Path of the artifact inside `dir`.
    pub fn artifact_path(dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(MODEL_FILE_NAME)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.model.algorithm()
    }

    /// Feature columns in the order the model expects them.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn fitted(&self) -> &FittedModel {
        &self.model
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            algorithm: self.algorithm(),
            target: self.target.clone(),
            feature_names: self.feature_names.clone(),
            metrics: self.metrics,
        }
    }

    /// Predict the target from named feature values.
    ///
    /// Features missing from `inputs` default to 0.0. Names the model does
    /// not know are rejected.
    pub fn predict(&self, inputs: &HashMap<String, f64>) -> Result<PredictionResult> {
        let mut unknown: Vec<&String> = inputs
            .keys()
            .filter(|name| !self.feature_names.contains(name))
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(LearningError::InferenceError(format!(
                "unknown feature '{}'; the model expects: {}",
                unknown[0],
                self.feature_names.join(", ")
            )));
        }

        let mut row = Vec::with_capacity(self.feature_names.len());
        for name in &self.feature_names {
            let value = inputs.get(name).copied().unwrap_or(0.0);
            if !value.is_finite() {
                return Err(LearningError::InferenceError(format!(
                    "feature '{}' must be a finite number",
                    name
                )));
            }
            row.push(value);
        }

        let prediction = self.model.predict_row(&row);
        Ok(PredictionResult {
            target: self.target.clone(),
            prediction,
            inputs: self.feature_names.iter().cloned().zip(row).collect(),
        })
    }

    /// Predict a batch of feature rows already in model order.
    pub fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        let width = self.feature_names.len();
        if let Some(row) = rows.iter().find(|row| row.len() != width) {
            return Err(LearningError::InferenceError(format!(
                "expected {} feature values, got {}",
                width,
                row.len()
            )));
        }
        Ok(self.model.predict(rows))
    }

    /// Save the model as JSON at `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        info!("Saved {} model to {}", self.algorithm(), path.display());
        Ok(())
    }

    /// Save under [`MODEL_FILE_NAME`] in `dir`, replacing any earlier model.
    pub fn save_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = Self::artifact_path(dir);
        self.save(&path)?;
        Ok(path)
    }

    /// Load a model saved with [`save()`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::ModelNotFound`] if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LearningError::ModelNotFound {
                path: path.display().to_string(),
            });
        }
        let bytes = fs::read(path)?;
        let model: TrainedModel = serde_json::from_slice(&bytes)?;
        Ok(model)
    }

    /// Load the model saved under [`MODEL_FILE_NAME`] in `dir`.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::load(Self::artifact_path(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{LinearRegression, Regressor};
    use pretty_assertions::assert_eq;

    fn rain_model() -> TrainedModel {
        // Temp = 5 + 0.5 * Rain - 2 * Altitude
        let rows = vec![
            vec![10.0, 1.0],
            vec![20.0, 2.0],
            vec![30.0, 1.5],
            vec![40.0, 3.0],
        ];
        let target: Vec<f64> = rows.iter().map(|r| 5.0 + 0.5 * r[0] - 2.0 * r[1]).collect();
        let mut model = LinearRegression::default();
        model.fit(&rows, &target).unwrap();

        TrainedModel::new(
            vec!["Rain".to_string(), "Altitude".to_string()],
            "Temp".to_string(),
            Metrics {
                r2: 1.0,
                rmse: 0.0,
                mae: 0.0,
            },
            FittedModel::LinearRegression(model),
        )
    }

    #[test]
    fn test_predict_with_all_features() {
        let model = rain_model();
        let inputs = HashMap::from([("Rain".to_string(), 20.0), ("Altitude".to_string(), 1.0)]);
        let result = model.predict(&inputs).unwrap();
        assert!((result.prediction - 13.0).abs() < 1e-9);
        assert_eq!(result.target, "Temp");
    }

    #[test]
    fn test_omitted_features_default_to_zero() {
        let model = rain_model();
        let inputs = HashMap::from([("Rain".to_string(), 10.0)]);
        let result = model.predict(&inputs).unwrap();
        assert!((result.prediction - 10.0).abs() < 1e-9);
        assert_eq!(
            result.inputs,
            vec![("Rain".to_string(), 10.0), ("Altitude".to_string(), 0.0)]
        );
    }

    #[test]
    fn test_unknown_feature_is_rejected() {
        let model = rain_model();
        let inputs = HashMap::from([("Humidity".to_string(), 1.0)]);
        let err = model.predict(&inputs).unwrap_err();
        assert!(matches!(err, LearningError::InferenceError(m) if m.contains("Humidity")));
    }

    #[test]
    fn test_predict_rows_checks_width() {
        let model = rain_model();
        assert!(model.predict_rows(&[vec![1.0]]).is_err());
        assert_eq!(model.predict_rows(&[vec![0.0, 0.0]]).unwrap().len(), 1);
    }

    #[test]
    fn test_save_and_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        let model = rain_model();

        let path = model.save_to_dir(dir.path()).unwrap();
        assert!(path.ends_with(MODEL_FILE_NAME));

        let loaded = TrainedModel::load_from_dir(dir.path()).unwrap();
        assert_eq!(loaded.info(), model.info());
        assert_eq!(loaded.feature_names(), model.feature_names());
    }

    #[test]
    fn test_load_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrainedModel::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, LearningError::ModelNotFound { .. }));
        assert_eq!(err.error_code(), "MODEL_NOT_FOUND");
    }
}
