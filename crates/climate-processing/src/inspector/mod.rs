//! Column inspector: declared types and missing-value counts of a table.
//!
//! [`inspect`] is pure and walks every column once. [`InspectorCache`]
//! memoizes summaries per dataset so repeated reads of an unchanged working
//! copy do not rescan it.

use polars::prelude::*;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

use crate::error::Result;
use crate::types::{ColumnSummary, ColumnType, MissingEntry, TypeEntry};
use crate::utils::missing_count;

/// Type and missing-value summaries for every column, in table order.
pub fn inspect(df: &DataFrame) -> Result<ColumnSummary> {
    let mut types = Vec::with_capacity(df.width());
    let mut missing = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let name = column.name().to_string();
        let series = column.as_materialized_series();
        types.push(TypeEntry {
            column: name.clone(),
            dtype: ColumnType::label_for(series.dtype()),
        });
        missing.push(MissingEntry {
            column: name,
            missing: missing_count(series)?,
        });
    }

    Ok(ColumnSummary {
        rows: df.height(),
        types,
        missing,
    })
}

// =============================================================================
// Memoization
// =============================================================================

/// Identity of one working-copy snapshot.
///
/// The generation changes on every committed stage, so two snapshots with the
/// same shape and dtypes (e.g. before and after an imputation) never share a
/// key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub generation: u64,
    pub rows: usize,
    pub schema_hash: u64,
}

impl SnapshotKey {
    pub fn of(df: &DataFrame, generation: u64) -> Self {
        Self {
            generation,
            rows: df.height(),
            schema_hash: schema_signature(df),
        }
    }
}

/// Hash of column names and dtypes, in order.
pub fn schema_signature(df: &DataFrame) -> u64 {
    let mut hasher = DefaultHasher::new();
    for column in df.get_columns() {
        column.name().as_str().hash(&mut hasher);
        column.dtype().to_string().hash(&mut hasher);
    }
    hasher.finish()
}

/// Per-dataset memo of the last computed summary.
#[derive(Debug, Default, Clone)]
pub struct InspectorCache {
    entries: HashMap<String, (SnapshotKey, ColumnSummary)>,
    hits: u64,
    misses: u64,
}

impl InspectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary of `df`, recomputed only when the snapshot key changed.
    pub fn summary(&mut self, dataset: &str, df: &DataFrame, generation: u64) -> Result<ColumnSummary> {
        let key = SnapshotKey::of(df, generation);
        if let Some((cached_key, summary)) = self.entries.get(dataset) {
            if *cached_key == key {
                self.hits += 1;
                return Ok(summary.clone());
            }
        }

        self.misses += 1;
        debug!("Inspecting '{}' at generation {}", dataset, generation);
        let summary = inspect(df)?;
        self.entries
            .insert(dataset.to_string(), (key, summary.clone()));
        Ok(summary)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
