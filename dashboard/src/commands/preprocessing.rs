//! Preprocessing page commands.
//!
//! Each command takes the session lock for the duration of one interaction.
//! Stage failures come back as errors and leave the working copy as it was,
//! so the caller can show the message and let the user try again.

use climate_processing::{
    ColumnSummary, ColumnType, MeltParams, MissingStrategy, PreprocessingStage, StageReport,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::CommandResult;
use crate::state::AppState;

/// Shape of a dataset once preprocessing is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedInfo {
    pub dataset: String,
    pub rows: usize,
    pub columns: usize,
}

/// Select a dataset for preprocessing, creating its working copy on first use.
pub fn select_dataset(state: &AppState, name: &str) -> CommandResult<ColumnSummary> {
    let summary = state.session.write().select_dataset(&state.registry, name)?;
    info!("Selected '{}' ({})", name, summary.shape_label());
    Ok(summary)
}

/// Current column summary of a working copy.
pub fn column_summary(state: &AppState, name: &str) -> CommandResult<ColumnSummary> {
    Ok(state.session.write().column_summary(name)?)
}

/// Run one stage on the working copy of `name`.
pub fn apply_stage(
    state: &AppState,
    name: &str,
    stage: &PreprocessingStage,
) -> CommandResult<StageReport> {
    let result = state.session.write().apply_stage(name, stage);
    match &result {
        Ok(report) => {
            for note in &report.notes {
                warn!("{}: {}", stage.display_name(), note);
            }
        }
        Err(err) => warn!("{} failed on '{}': {}", stage.display_name(), name, err),
    }
    Ok(result?)
}

pub fn melt(state: &AppState, name: &str, params: MeltParams) -> CommandResult<StageReport> {
    apply_stage(state, name, &PreprocessingStage::Melt(params))
}

pub fn handle_missing(
    state: &AppState,
    name: &str,
    strategy: MissingStrategy,
) -> CommandResult<StageReport> {
    apply_stage(state, name, &PreprocessingStage::HandleMissing { strategy })
}

pub fn coerce(
    state: &AppState,
    name: &str,
    types: HashMap<String, ColumnType>,
) -> CommandResult<StageReport> {
    apply_stage(state, name, &PreprocessingStage::Coerce { types })
}

/// Undo the last committed stage.
pub fn revert_last_stage(state: &AppState, name: &str) -> CommandResult<ColumnSummary> {
    let summary = state.session.write().revert_last_stage(name)?;
    info!("Reverted last stage of '{}'", name);
    Ok(summary)
}

/// Store the working copy as the processed dataset used by later pages.
pub fn complete_preprocessing(state: &AppState, name: &str) -> CommandResult<ProcessedInfo> {
    let (rows, columns) = state.session.write().complete_preprocessing(name)?;
    Ok(ProcessedInfo {
        dataset: name.to_string(),
        rows,
        columns,
    })
}

/// Names of processed datasets, sorted.
pub fn processed_datasets(state: &AppState) -> Vec<String> {
    state
        .session
        .read()
        .processed_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Forget every working copy, processed dataset and selection.
pub fn reset_session(state: &AppState) {
    state.session.write().reset();
    *state.training_result.write() = None;
    info!("Session reset");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::error::CommandError;
    use climate_processing::{Dataset, DatasetRegistry, PreprocessingError};
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    const CLIMATE: &str = "Monthly Climate";

    fn state() -> AppState {
        let mut registry = DatasetRegistry::default();
        registry.insert(
            CLIMATE,
            Dataset::Tabular(
                df![
                    "District" => ["Kaski", "Jumla"],
                    "Jan" => [Some(8.5), None],
                    "Feb" => [Some(10.0), Some(2.5)],
                ]
                .unwrap(),
            ),
        );
        AppState::with_registry(DashboardConfig::default(), registry)
    }

    #[test]
    fn test_select_then_melt() {
        let state = state();
        let summary = select_dataset(&state, CLIMATE).unwrap();
        assert_eq!(summary.rows, 2);

        let report = melt(&state, CLIMATE, MeltParams::new(["District"], "Month", "Temp")).unwrap();
        assert_eq!(report.before, (2, 3));
        assert_eq!(report.after, (4, 3));
        assert_eq!(report.summary.columns(), vec!["District", "Month", "Temp"]);
    }

    #[test]
    fn test_failed_stage_keeps_working_copy() {
        let state = state();
        select_dataset(&state, CLIMATE).unwrap();

        let err = melt(
            &state,
            CLIMATE,
            MeltParams::new(["District", "Jan", "Feb"], "Month", "Temp"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CommandError::Preprocessing(PreprocessingError::InvalidReshape(_))
        ));
        assert_eq!(column_summary(&state, CLIMATE).unwrap().rows, 2);
    }

    #[test]
    fn test_missing_revert_and_complete() {
        let state = state();
        select_dataset(&state, CLIMATE).unwrap();

        let report = handle_missing(&state, CLIMATE, MissingStrategy::DropRows).unwrap();
        assert_eq!(report.after, (1, 3));

        let summary = revert_last_stage(&state, CLIMATE).unwrap();
        assert_eq!(summary.rows, 2);

        let processed = complete_preprocessing(&state, CLIMATE).unwrap();
        assert_eq!(
            processed,
            ProcessedInfo {
                dataset: CLIMATE.to_string(),
                rows: 2,
                columns: 3,
            }
        );
        assert_eq!(processed_datasets(&state), vec![CLIMATE.to_string()]);

        reset_session(&state);
        assert!(processed_datasets(&state).is_empty());
    }

    #[test]
    fn test_coerce_stage() {
        let state = state();
        select_dataset(&state, CLIMATE).unwrap();
        let types = HashMap::from([("District".to_string(), ColumnType::Category)]);
        let report = coerce(&state, CLIMATE, types).unwrap();
        assert_eq!(report.summary.dtype_of("District"), Some("category"));
    }
}
