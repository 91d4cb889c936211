//! Preprocessing stages and their reports.

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::coercion::coerce;
use crate::error::Result;
use crate::imputers::{MissingStrategy, resolve_missing};
use crate::reshape::{MeltParams, melt};
use crate::types::{ColumnSummary, ColumnType};

/// One user-selected transformation of a working copy.
///
/// Stages are pure: they read a table and produce a new one, leaving the
/// input untouched whether they succeed or fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PreprocessingStage {
    /// Wide-to-long reshape
    Melt(MeltParams),
    /// Missing-value resolution
    HandleMissing { strategy: MissingStrategy },
    /// Type coercion; unmapped columns keep their type
    Coerce { types: HashMap<String, ColumnType> },
}

impl PreprocessingStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Melt(_) => "Reshape",
            Self::HandleMissing { .. } => "Handle Missing Values",
            Self::Coerce { .. } => "Convert Data Types",
        }
    }

    /// Run the stage on `df`, returning the new table and any notes.
    pub fn run(&self, df: &DataFrame) -> Result<StageOutput> {
        match self {
            Self::Melt(params) => {
                let outcome = melt(df, params)?;
                Ok(StageOutput {
                    table: outcome.table,
                    notes: outcome.warnings,
                })
            }
            Self::HandleMissing { strategy } => {
                let mut notes = Vec::new();
                let table = resolve_missing(df, *strategy, &mut notes)?;
                Ok(StageOutput { table, notes })
            }
            Self::Coerce { types } => Ok(StageOutput {
                table: coerce(df, types)?,
                notes: Vec::new(),
            }),
        }
    }
}

/// Table produced by a stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub table: DataFrame,
    pub notes: Vec<String>,
}

/// What a committed stage did to a working copy.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub dataset: String,
    pub stage: String,
    /// (rows, columns) before the stage.
    pub before: (usize, usize),
    /// (rows, columns) after the stage.
    pub after: (usize, usize),
    pub notes: Vec<String>,
    /// Summary of the committed table.
    pub summary: ColumnSummary,
}
