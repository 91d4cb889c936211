//! Modeling and prediction commands.
//!
//! Training reads the feature selection stored in the session, fits on the
//! selected processed dataset and saves the model as the fixed artifact in
//! the configured model directory. Prediction only needs that artifact.

use climate_learning::{
    ModelInfo, Pipeline, PredictionResult, TrainedModel, TrainingConfig, TrainingResult,
};
use climate_processing::FeatureSelection;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

use crate::error::{CommandError, CommandResult};
use crate::state::AppState;

/// A finished training run and where its model was saved.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingOutcome {
    pub dataset: String,
    pub result: TrainingResult,
    pub artifact: PathBuf,
}

/// Record feature and target columns of a processed dataset.
pub fn select_features(
    state: &AppState,
    dataset: &str,
    x_columns: Vec<String>,
    y_column: &str,
) -> CommandResult<FeatureSelection> {
    let mut session = state.session.write();
    session.set_feature_selection(dataset, x_columns, y_column)?;
    session
        .feature_selection()
        .cloned()
        .ok_or(CommandError::NoFeatureSelection)
}

/// Train on the current feature selection and save the model.
///
/// `config` falls back to the training settings of the dashboard config.
pub fn train_model(state: &AppState, config: Option<TrainingConfig>) -> CommandResult<TrainingOutcome> {
    let (selection, df) = {
        let session = state.session.read();
        let selection = session
            .feature_selection()
            .cloned()
            .ok_or(CommandError::NoFeatureSelection)?;
        let df = session.processed(&selection.dataset)?.clone();
        (selection, df)
    };

    let config = config.unwrap_or_else(|| state.config.training.clone());
    info!(
        "Training {} on '{}' ({} rows, test size {:.0}%)",
        config.algorithm,
        selection.dataset,
        df.height(),
        config.test_size * 100.0
    );

    let mut pipeline = Pipeline::builder()
        .config(config)
        .features(selection.x_columns.iter().cloned())
        .target(selection.y_column.clone())
        .on_progress(|update| {
            info!(
                "[{:>3.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.as_str(),
                update.message
            );
        })
        .build()?;

    let result = pipeline.train(&df)?;
    let artifact = pipeline
        .create_trained_model()?
        .save_to_dir(&state.config.model_dir)?;

    *state.training_result.write() = Some(result.clone());
    Ok(TrainingOutcome {
        dataset: selection.dataset,
        result,
        artifact,
    })
}

/// Load the saved model and predict from named feature values.
///
/// Omitted features default to 0.0.
pub fn predict(state: &AppState, inputs: &HashMap<String, f64>) -> CommandResult<PredictionResult> {
    let model = TrainedModel::load_from_dir(&state.config.model_dir)?;
    let result = model.predict(inputs)?;
    info!("Predicted {} = {:.4}", result.target, result.prediction);
    Ok(result)
}

/// Metadata of the saved model, e.g. to build the prediction form.
pub fn model_info(state: &AppState) -> CommandResult<ModelInfo> {
    Ok(TrainedModel::load_from_dir(&state.config.model_dir)?.info())
}

/// Result of the last training run in this session.
pub fn last_training_result(state: &AppState) -> Option<TrainingResult> {
    state.training_result.read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use climate_learning::{Algorithm, LearningError};
    use climate_processing::{Dataset, DatasetRegistry, PreprocessingError};
    use polars::prelude::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    /// Temperature = 30 - 0.005 * Elevation over 20 stations.
    fn state(dir: &Path) -> AppState {
        let elevation: Vec<f64> = (0..20).map(|i| 200.0 + (i * 7 % 20) as f64 * 150.0).collect();
        let temperature: Vec<f64> = elevation.iter().map(|e| 30.0 - 0.005 * e).collect();
        let mut registry = DatasetRegistry::default();
        registry.insert(
            "Stations",
            Dataset::Tabular(
                df!["Elevation" => elevation, "Temperature" => temperature].unwrap(),
            ),
        );
        let config = DashboardConfig::builder().model_dir(dir).build().unwrap();
        let state = AppState::with_registry(config, registry);
        {
            let mut session = state.session.write();
            session.select_dataset(&state.registry, "Stations").unwrap();
            session.complete_preprocessing("Stations").unwrap();
        }
        state
    }

    #[test]
    fn test_train_requires_selection() {
        let dir = tempfile::tempdir().unwrap();
        let err = train_model(&state(dir.path()), None).unwrap_err();
        assert!(matches!(err, CommandError::NoFeatureSelection));
    }

    #[test]
    fn test_select_features_validates_columns() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let err = select_features(&state, "Stations", vec!["Rain".to_string()], "Temperature")
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::Preprocessing(PreprocessingError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_train_then_predict() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        select_features(&state, "Stations", vec!["Elevation".to_string()], "Temperature").unwrap();

        let outcome = train_model(&state, None).unwrap();
        assert_eq!(outcome.result.algorithm, Algorithm::LinearRegression);
        assert_eq!(outcome.result.test_rows, 4);
        assert!(outcome.artifact.exists());
        assert!(last_training_result(&state).is_some());

        let info = model_info(&state).unwrap();
        assert_eq!(info.feature_names, vec!["Elevation".to_string()]);

        let result = predict(&state, &HashMap::from([("Elevation".to_string(), 1000.0)])).unwrap();
        assert!((result.prediction - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_predict_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = predict(&state(dir.path()), &HashMap::new()).unwrap_err();
        assert!(matches!(
            err,
            CommandError::Learning(LearningError::ModelNotFound { .. })
        ));
    }
}
