//! Session state store.
//!
//! [`SessionState`] is the one mutable object of an interactive session. It
//! owns the working copy of every selected dataset, the memoized column
//! summaries, the processed datasets and the feature selection used by the
//! modeling stages. Everything starts empty and lives as long as the session.
//!
//! Stages never mutate a working copy in place: the new table is computed
//! from the current one and swapped in only when the stage succeeds.

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use super::stage::{PreprocessingStage, StageReport};
use crate::error::{PreprocessingError, Result};
use crate::inspector::InspectorCache;
use crate::registry::DatasetRegistry;
use crate::types::ColumnSummary;

/// Mutable table derived from a registry dataset.
#[derive(Debug, Clone)]
struct WorkingCopy {
    table: DataFrame,
    /// Bumped on every committed change.
    generation: u64,
    /// Table before the last committed stage.
    previous: Option<DataFrame>,
}

/// Feature and target columns picked for model training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSelection {
    pub dataset: String,
    pub x_columns: Vec<String>,
    pub y_column: String,
}

/// Typed session context passed to every stage.
#[derive(Debug, Default)]
pub struct SessionState {
    working: HashMap<String, WorkingCopy>,
    summaries: InspectorCache,
    processed: BTreeMap<String, DataFrame>,
    feature_selection: Option<FeatureSelection>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Working copies
    // =========================================================================

    /// Make `name` the dataset being preprocessed.
    ///
    /// The working copy is cloned from the registry on first selection and
    /// kept as-is on later selections.
    pub fn select_dataset(
        &mut self,
        registry: &DatasetRegistry,
        name: &str,
    ) -> Result<ColumnSummary> {
        if !self.working.contains_key(name) {
            let table = registry.table(name)?.clone();
            debug!("Created working copy of '{}'", name);
            self.working.insert(
                name.to_string(),
                WorkingCopy {
                    table,
                    generation: 0,
                    previous: None,
                },
            );
        }
        self.column_summary(name)
    }

    pub fn has_working_copy(&self, name: &str) -> bool {
        self.working.contains_key(name)
    }

    pub fn working_copy(&self, name: &str) -> Result<&DataFrame> {
        self.copy(name).map(|copy| &copy.table)
    }

    /// Generation of the working copy, starting at 0.
    pub fn generation(&self, name: &str) -> Result<u64> {
        self.copy(name).map(|copy| copy.generation)
    }

    pub fn can_revert(&self, name: &str) -> bool {
        self.working
            .get(name)
            .is_some_and(|copy| copy.previous.is_some())
    }

    fn copy(&self, name: &str) -> Result<&WorkingCopy> {
        self.working
            .get(name)
            .ok_or_else(|| PreprocessingError::NoWorkingCopy(name.to_string()))
    }

    /// Column summary of the current working copy.
    pub fn column_summary(&mut self, name: &str) -> Result<ColumnSummary> {
        let copy = self
            .working
            .get(name)
            .ok_or_else(|| PreprocessingError::NoWorkingCopy(name.to_string()))?;
        self.summaries.summary(name, &copy.table, copy.generation)
    }

    /// Run a stage on the working copy and commit its result.
    ///
    /// On failure the working copy is left exactly as it was and the error is
    /// returned for display.
    pub fn apply_stage(&mut self, name: &str, stage: &PreprocessingStage) -> Result<StageReport> {
        let copy = self
            .working
            .get(name)
            .ok_or_else(|| PreprocessingError::NoWorkingCopy(name.to_string()))?;
        let before = copy.table.shape();

        let output = match stage.run(&copy.table) {
            Ok(output) => output,
            Err(e) => {
                warn!("{} on '{}' failed: {}", stage.display_name(), name, e);
                return Err(e);
            }
        };

        let after = output.table.shape();
        self.commit(name, output.table);
        info!(
            "{} on '{}': {}x{} -> {}x{}",
            stage.display_name(),
            name,
            before.0,
            before.1,
            after.0,
            after.1
        );

        Ok(StageReport {
            dataset: name.to_string(),
            stage: stage.display_name().to_string(),
            before,
            after,
            notes: output.notes,
            summary: self.column_summary(name)?,
        })
    }

    fn commit(&mut self, name: &str, table: DataFrame) {
        if let Some(copy) = self.working.get_mut(name) {
            let old = std::mem::replace(&mut copy.table, table);
            copy.previous = Some(old);
            copy.generation += 1;
        }
    }

    /// Restore the table from before the last committed stage.
    ///
    /// Only one level is kept; a second revert in a row fails.
    pub fn revert_last_stage(&mut self, name: &str) -> Result<ColumnSummary> {
        let copy = self
            .working
            .get_mut(name)
            .ok_or_else(|| PreprocessingError::NoWorkingCopy(name.to_string()))?;
        let previous = copy
            .previous
            .take()
            .ok_or_else(|| PreprocessingError::NothingToRevert(name.to_string()))?;
        copy.table = previous;
        copy.generation += 1;
        info!("Reverted last stage on '{}'", name);
        self.column_summary(name)
    }

    // =========================================================================
    // Processed datasets
    // =========================================================================

    /// Freeze the working copy into the processed slot for `name`.
    ///
    /// Running it again overwrites the earlier processed table.
    pub fn complete_preprocessing(&mut self, name: &str) -> Result<(usize, usize)> {
        let table = self.working_copy(name)?.clone();
        let shape = table.shape();
        if self.processed.insert(name.to_string(), table).is_some() {
            debug!("Replaced processed dataset '{}'", name);
        }
        info!("Completed preprocessing of '{}' ({}x{})", name, shape.0, shape.1);
        Ok(shape)
    }

    pub fn processed(&self, name: &str) -> Result<&DataFrame> {
        self.processed
            .get(name)
            .ok_or_else(|| PreprocessingError::NotProcessed(name.to_string()))
    }

    /// Names of processed datasets, sorted.
    pub fn processed_names(&self) -> Vec<&str> {
        self.processed.keys().map(String::as_str).collect()
    }

    // =========================================================================
    // Feature selection
    // =========================================================================

    /// Record feature and target columns of a processed dataset.
    pub fn set_feature_selection(
        &mut self,
        dataset: &str,
        x_columns: Vec<String>,
        y_column: &str,
    ) -> Result<()> {
        let table = self.processed(dataset)?;
        let invalid = |msg: String| Err(PreprocessingError::InvalidSelection(msg));

        if x_columns.is_empty() {
            return invalid("select at least one feature column".to_string());
        }
        if x_columns.iter().any(|x| x == y_column) {
            return invalid(format!("'{}' cannot be both a feature and the target", y_column));
        }
        for (index, column) in x_columns.iter().enumerate() {
            if x_columns[..index].contains(column) {
                return invalid(format!("feature '{}' is selected twice", column));
            }
        }
        for column in x_columns.iter().map(String::as_str).chain([y_column]) {
            if table.column(column).is_err() {
                return Err(PreprocessingError::ColumnNotFound(column.to_string()));
            }
        }

        self.feature_selection = Some(FeatureSelection {
            dataset: dataset.to_string(),
            x_columns,
            y_column: y_column.to_string(),
        });
        Ok(())
    }

    pub fn feature_selection(&self) -> Option<&FeatureSelection> {
        self.feature_selection.as_ref()
    }

    /// Drop everything, as at session start.
    pub fn reset(&mut self) {
        self.working.clear();
        self.summaries.clear();
        self.processed.clear();
        self.feature_selection = None;
    }
}

static_assertions::assert_impl_all!(SessionState: Send, Sync);
