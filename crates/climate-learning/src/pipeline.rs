//! Training pipeline.
//!
//! The pipeline runs these stages in order:
//!
//! 1. **Extracting** - read numeric feature and target columns
//! 2. **Splitting** - shuffle rows into training and test splits
//! 3. **Fitting** - fit the configured algorithm on the training split
//! 4. **Evaluating** - compute R², RMSE and MAE on the test split
//!
//! # Example
//!
//! ```rust,ignore
//! use climate_learning::{Algorithm, Pipeline, TrainingConfig};
//!
//! let config = TrainingConfig::builder()
//!     .algorithm(Algorithm::DecisionTree)
//!     .build()?;
//!
//! let mut pipeline = Pipeline::builder()
//!     .config(config)
//!     .features(["Rainfall", "Humidity"])
//!     .target("Temperature")
//!     .on_progress(|u| println!("{:.0}% - {}", u.progress * 100.0, u.message))
//!     .build()?;
//!
//! let result = pipeline.train(&dataframe)?;
//! println!("R² = {:.4}", result.metrics.r2);
//!
//! let model = pipeline.create_trained_model()?;
//! model.save_to_dir("models")?;
//! ```

use polars::prelude::DataFrame;
use std::sync::Arc;
use tracing::{debug, info};

use crate::algorithms::FittedModel;
use crate::config::TrainingConfig;
use crate::data::{TrainingData, extract};
use crate::error::{LearningError, Result};
use crate::metrics::evaluate;
use crate::model::TrainedModel;
use crate::progress::{ProgressCallback, ProgressUpdate, TrainingStage};
use crate::split::train_test_split;
use crate::types::{PREVIEW_ROWS, PredictionPair, TrainingResult};

/// The training pipeline.
///
/// Use [`Pipeline::builder()`] to construct one, call [`train()`](Self::train)
/// with a processed dataset, then [`create_trained_model()`](Self::create_trained_model).
pub struct Pipeline {
    config: TrainingConfig,
    features: Vec<String>,
    target: String,
    progress_callback: Option<ProgressCallback>,
    last_model: Option<TrainedModel>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("features", &self.features)
            .field("target", &self.target)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .field("last_model", &self.last_model.as_ref().map(|m| m.algorithm()))
            .finish()
    }
}

impl Pipeline {
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    fn report(&self, stage: TrainingStage, message: impl Into<String>) {
        let update = ProgressUpdate::new(stage, message);
        debug!("[{}] {}", update.stage.as_str(), update.message);
        if let Some(callback) = &self.progress_callback {
            callback(update);
        }
    }

    /// Fit the configured algorithm on `df` and evaluate it.
    ///
    /// # Errors
    ///
    /// - [`TargetNotFound`](LearningError::TargetNotFound) or
    ///   [`FeatureNotFound`](LearningError::FeatureNotFound) for unknown columns
    /// - [`InvalidData`](LearningError::InvalidData) for non-numeric columns,
    ///   missing values, or too few rows to split
    /// - [`TrainingFailed`](LearningError::TrainingFailed) if fitting fails
    pub fn train(&mut self, df: &DataFrame) -> Result<TrainingResult> {
        self.report(TrainingStage::Extracting, "Reading feature and target columns");
        let data = extract(df, &self.features, &self.target)?;

        self.report(
            TrainingStage::Splitting,
            format!("Holding out {:.0}% of rows for testing", self.config.test_size * 100.0),
        );
        let split = train_test_split(data.len(), self.config.test_size, self.config.random_seed)?;
        let (train_rows, train_target) = data.subset(&split.train);
        let (test_rows, test_target) = data.subset(&split.test);

        let warnings = constant_feature_warnings(&data, &train_rows);

        self.report(
            TrainingStage::Fitting,
            format!("Fitting {}", self.config.algorithm),
        );
        let fitted = FittedModel::fit(&self.config, &train_rows, &train_target)?;

        self.report(TrainingStage::Evaluating, "Scoring the test split");
        let predictions = fitted.predict(&test_rows);
        let metrics = evaluate(&test_target, &predictions)?;
        let preview = test_target
            .iter()
            .zip(&predictions)
            .take(PREVIEW_ROWS)
            .map(|(&actual, &predicted)| PredictionPair { actual, predicted })
            .collect();

        info!(
            "Trained {} on {} rows: R²={:.4}, RMSE={:.4}, MAE={:.4}",
            self.config.algorithm,
            train_rows.len(),
            metrics.r2,
            metrics.rmse,
            metrics.mae
        );
        self.report(TrainingStage::Complete, "Model training completed");

        self.last_model = Some(TrainedModel::new(
            data.feature_names.clone(),
            data.target_name.clone(),
            metrics,
            fitted,
        ));

        Ok(TrainingResult {
            algorithm: self.config.algorithm,
            feature_names: data.feature_names,
            target: data.target_name,
            train_rows: train_rows.len(),
            test_rows: test_rows.len(),
            metrics,
            preview,
            warnings,
        })
    }

    /// The model fitted by the last successful [`train()`](Self::train).
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::TrainingFailed`] if no training run has succeeded.
    pub fn create_trained_model(&self) -> Result<TrainedModel> {
        self.last_model.clone().ok_or_else(|| {
            LearningError::TrainingFailed("no training result available; call train() first".to_string())
        })
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    #[must_use]
    pub fn has_training_result(&self) -> bool {
        self.last_model.is_some()
    }
}

fn constant_feature_warnings(data: &TrainingData, train_rows: &[Vec<f64>]) -> Vec<String> {
    let Some(first) = train_rows.first() else {
        return Vec::new();
    };
    data.feature_names
        .iter()
        .enumerate()
        .filter(|(j, _)| train_rows.iter().all(|row| row[*j] == first[*j]))
        .map(|(_, name)| format!("Feature '{}' is constant in the training split", name))
        .collect()
}

/// Builder for [`Pipeline`].
///
/// `features` and `target` are required; `config` defaults to
/// [`TrainingConfig::default()`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<TrainingConfig>,
    features: Vec<String>,
    target: Option<String>,
    progress_callback: Option<ProgressCallback>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn config(mut self, config: TrainingConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the feature columns, in model order.
    #[must_use]
    pub fn features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set a callback for stage progress.
    #[must_use]
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Build the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] if no features or target are
    /// set, the target is also a feature, a feature repeats, or the config is
    /// invalid.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let target = self
            .target
            .ok_or_else(|| LearningError::InvalidConfig("a target column is required".to_string()))?;
        if self.features.is_empty() {
            return Err(LearningError::InvalidConfig(
                "at least one feature column is required".to_string(),
            ));
        }
        if self.features.contains(&target) {
            return Err(LearningError::InvalidConfig(format!(
                "target column '{}' cannot also be a feature",
                target
            )));
        }
        for (i, feature) in self.features.iter().enumerate() {
            if self.features[..i].contains(feature) {
                return Err(LearningError::InvalidConfig(format!(
                    "feature column '{}' is listed twice",
                    feature
                )));
            }
        }

        Ok(Pipeline {
            config,
            features: self.features,
            target,
            progress_callback: self.progress_callback,
            last_model: None,
        })
    }
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);
static_assertions::assert_impl_all!(TrainedModel: Send, Sync);
