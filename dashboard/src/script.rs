//! Session scripts: a JSON array of page actions replayed in order.
//!
//! ```json
//! [
//!   { "action": "select", "dataset": "District Wise Monthly Climate" },
//!   { "action": "handle_missing", "dataset": "District Wise Monthly Climate",
//!     "strategy": "fill_mean" },
//!   { "action": "complete", "dataset": "District Wise Monthly Climate" },
//!   { "action": "analyze", "histogram": "avg_temp" },
//!   { "action": "select_features", "dataset": "District Wise Monthly Climate",
//!     "x_columns": ["precip"], "y_column": "avg_temp" },
//!   { "action": "train", "config": { "algorithm": "decision_tree" } },
//!   { "action": "predict", "features": { "precip": 120.0 } }
//! ]
//! ```
//!
//! A failing action is recorded with its error and the script moves on,
//! the same way a page shows the message and keeps the session usable.

use climate_learning::TrainingConfig;
use climate_processing::{ColumnType, MeltParams, MissingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::commands;
use crate::commands::AnalysisRequest;
use crate::error::{CommandError, CommandResult};
use crate::state::AppState;

/// One step of a session script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptAction {
    Select {
        dataset: String,
    },
    Melt {
        dataset: String,
        #[serde(default)]
        id_columns: Vec<String>,
        variable_name: String,
        value_name: String,
    },
    HandleMissing {
        dataset: String,
        strategy: MissingStrategy,
    },
    Coerce {
        dataset: String,
        types: HashMap<String, ColumnType>,
    },
    Revert {
        dataset: String,
    },
    Complete {
        dataset: String,
    },
    Summary {
        dataset: String,
    },
    Analyze(AnalysisRequest),
    SelectFeatures {
        dataset: String,
        x_columns: Vec<String>,
        y_column: String,
    },
    Train {
        #[serde(default)]
        config: Option<TrainingConfig>,
    },
    Predict {
        #[serde(default)]
        features: HashMap<String, f64>,
    },
}

impl ScriptAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Select { .. } => "select",
            Self::Melt { .. } => "melt",
            Self::HandleMissing { .. } => "handle_missing",
            Self::Coerce { .. } => "coerce",
            Self::Revert { .. } => "revert",
            Self::Complete { .. } => "complete",
            Self::Summary { .. } => "summary",
            Self::Analyze(_) => "analyze",
            Self::SelectFeatures { .. } => "select_features",
            Self::Train { .. } => "train",
            Self::Predict { .. } => "predict",
        }
    }
}

/// Outcome of one action.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Ok { output: Value },
    Failed { error: CommandError },
}

#[derive(Debug, Serialize)]
pub struct ScriptStep {
    pub index: usize,
    pub action: &'static str,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Serialize)]
pub struct ScriptReport {
    pub steps: Vec<ScriptStep>,
    pub failed: usize,
}

impl ScriptReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Parse a script from JSON text.
pub fn parse_script(text: &str) -> CommandResult<Vec<ScriptAction>> {
    serde_json::from_str(text).map_err(|e| CommandError::Script(e.to_string()))
}

/// Read and parse a script file.
pub fn load_script(path: &Path) -> CommandResult<Vec<ScriptAction>> {
    let text = std::fs::read_to_string(path)?;
    parse_script(&text)
}

/// Run every action in order. Failures are recorded, not fatal.
pub fn run_script(state: &AppState, actions: &[ScriptAction]) -> ScriptReport {
    let mut steps = Vec::with_capacity(actions.len());
    let mut failed = 0;

    for (index, action) in actions.iter().enumerate() {
        let outcome = match execute(state, action) {
            Ok(output) => StepOutcome::Ok { output },
            Err(error) => {
                warn!("Step {} ({}) failed: {}", index + 1, action.name(), error);
                failed += 1;
                StepOutcome::Failed { error }
            }
        };
        steps.push(ScriptStep {
            index,
            action: action.name(),
            outcome,
        });
    }

    info!(
        "Script finished: {} steps, {} failed",
        actions.len(),
        failed
    );
    ScriptReport { steps, failed }
}

/// Run one action and serialize its result.
pub fn execute(state: &AppState, action: &ScriptAction) -> CommandResult<Value> {
    let output = match action {
        ScriptAction::Select { dataset } => {
            serde_json::to_value(commands::select_dataset(state, dataset)?)?
        }
        ScriptAction::Melt {
            dataset,
            id_columns,
            variable_name,
            value_name,
        } => {
            let params = MeltParams::new(id_columns.iter().cloned(), variable_name, value_name);
            serde_json::to_value(commands::melt(state, dataset, params)?)?
        }
        ScriptAction::HandleMissing { dataset, strategy } => {
            serde_json::to_value(commands::handle_missing(state, dataset, *strategy)?)?
        }
        ScriptAction::Coerce { dataset, types } => {
            serde_json::to_value(commands::coerce(state, dataset, types.clone())?)?
        }
        ScriptAction::Revert { dataset } => {
            serde_json::to_value(commands::revert_last_stage(state, dataset)?)?
        }
        ScriptAction::Complete { dataset } => {
            serde_json::to_value(commands::complete_preprocessing(state, dataset)?)?
        }
        ScriptAction::Summary { dataset } => {
            serde_json::to_value(commands::column_summary(state, dataset)?)?
        }
        ScriptAction::Analyze(request) => {
            serde_json::to_value(commands::run_analysis(state, request)?)?
        }
        ScriptAction::SelectFeatures {
            dataset,
            x_columns,
            y_column,
        } => serde_json::to_value(commands::select_features(
            state,
            dataset,
            x_columns.clone(),
            y_column,
        )?)?,
        ScriptAction::Train { config } => {
            serde_json::to_value(commands::train_model(state, config.clone())?)?
        }
        ScriptAction::Predict { features } => {
            serde_json::to_value(commands::predict(state, features)?)?
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use climate_learning::Algorithm;
    use climate_processing::{Dataset, DatasetRegistry};
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn state() -> AppState {
        let mut registry = DatasetRegistry::default();
        registry.insert(
            "Climate",
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
    fn test_parse_actions() {
        let actions = parse_script(
            r#"[
                { "action": "select", "dataset": "Climate" },
                { "action": "melt", "dataset": "Climate", "id_columns": ["District"],
                  "variable_name": "Month", "value_name": "Temp" },
                { "action": "handle_missing", "dataset": "Climate", "strategy": "fill_median" },
                { "action": "coerce", "dataset": "Climate", "types": { "District": "category" } },
                { "action": "analyze", "histogram": "Temp", "bins": 10 },
                { "action": "train", "config": { "algorithm": "decision_tree", "max_depth": 3 } },
                { "action": "predict" }
            ]"#,
        )
        .unwrap();

        assert_eq!(actions.len(), 7);
        assert_eq!(
            actions[2],
            ScriptAction::HandleMissing {
                dataset: "Climate".to_string(),
                strategy: MissingStrategy::FillMedian,
            }
        );
        match &actions[4] {
            ScriptAction::Analyze(request) => {
                assert_eq!(request.histogram.as_deref(), Some("Temp"));
                assert_eq!(request.bins, Some(10));
                assert_eq!(request.dataset, None);
            }
            other => panic!("expected analyze, got {:?}", other),
        }
        match &actions[5] {
            ScriptAction::Train { config: Some(config) } => {
                assert_eq!(config.algorithm, Algorithm::DecisionTree);
                assert_eq!(config.max_depth, Some(3));
                assert_eq!(config.test_size, 0.2);
            }
            other => panic!("expected train, got {:?}", other),
        }
        assert_eq!(
            actions[6],
            ScriptAction::Predict {
                features: HashMap::new()
            }
        );
    }

    #[test]
    fn test_unknown_action_is_script_error() {
        let err = parse_script(r#"[{ "action": "plot" }]"#).unwrap_err();
        assert!(matches!(err, CommandError::Script(_)));
    }

    #[test]
    fn test_failed_step_does_not_stop_script() {
        let state = state();
        let actions = parse_script(
            r#"[
                { "action": "select", "dataset": "Climate" },
                { "action": "melt", "dataset": "Climate",
                  "id_columns": ["District", "Jan", "Feb"],
                  "variable_name": "Month", "value_name": "Temp" },
                { "action": "melt", "dataset": "Climate", "id_columns": ["District"],
                  "variable_name": "Month", "value_name": "Temp" },
                { "action": "handle_missing", "dataset": "Climate", "strategy": "drop_rows" },
                { "action": "complete", "dataset": "Climate" }
            ]"#,
        )
        .unwrap();

        let report = run_script(&state, &actions);
        assert_eq!(report.failed, 1);
        assert!(matches!(report.steps[1].outcome, StepOutcome::Failed { .. }));
        match &report.steps[4].outcome {
            StepOutcome::Ok { output } => {
                assert_eq!(output["rows"], 3);
                assert_eq!(output["columns"], 3);
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_step_serialization() {
        let state = state();
        let report = run_script(
            &state,
            &[ScriptAction::Analyze(AnalysisRequest::default())],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failed"], 1);
        assert_eq!(json["steps"][0]["action"], "analyze");
        assert_eq!(json["steps"][0]["status"], "failed");
        assert_eq!(json["steps"][0]["error"]["code"], "NO_PROCESSED_DATA");
    }
}
