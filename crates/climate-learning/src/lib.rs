//! climate-learning: regression training and prediction for the climate dashboard.
//!
//! Fits a model on a processed dataset, evaluates it on a held-out split and
//! saves it as a JSON artifact that the prediction page loads back.
//!
//! # Features
//!
//! - **Algorithms**: ordinary least squares and a CART regression tree
//! - **Reproducible splits**: shuffled with a fixed seed
//! - **Metrics**: R², RMSE and MAE on the test split
//! - **Artifact**: one `trained_model.json` per model directory
//! - **Progress Reporting**: stage callbacks during training
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use climate_learning::{Algorithm, Pipeline, TrainedModel, TrainingConfig};
//! use std::collections::HashMap;
//!
//! let config = TrainingConfig::builder()
//!     .algorithm(Algorithm::LinearRegression)
//!     .test_size(0.2)
//!     .build()?;
//!
//! let mut pipeline = Pipeline::builder()
//!     .config(config)
//!     .features(["Rainfall"])
//!     .target("Temperature")
//!     .build()?;
//!
//! let result = pipeline.train(&processed)?;
//! pipeline.create_trained_model()?.save_to_dir("models")?;
//!
//! let model = TrainedModel::load_from_dir("models")?;
//! let value = model.predict(&HashMap::from([("Rainfall".to_string(), 140.0)]))?;
//! ```

pub mod algorithms;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod split;
pub mod types;

// Re-exports for convenient access
pub use algorithms::{DecisionTree, FittedModel, LinearRegression, Regressor, TreeNode};
pub use config::{Algorithm, MAX_TEST_SIZE, MIN_TEST_SIZE, TrainingConfig, TrainingConfigBuilder};
pub use data::{TrainingData, extract};
pub use error::{LearningError, Result};
pub use metrics::{evaluate, mean_absolute_error, r2_score, root_mean_squared_error};
pub use model::{MODEL_FILE_NAME, TrainedModel};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use progress::{ProgressCallback, ProgressUpdate, TrainingStage};
pub use split::{SplitIndices, train_test_split};
pub use types::{Metrics, ModelInfo, PredictionPair, PredictionResult, TrainingResult};
