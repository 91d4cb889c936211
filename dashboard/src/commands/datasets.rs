//! Dataset overview commands: what loaded, what failed, and a look inside.

use climate_processing::registry::BoundingBox;
use climate_processing::{ColumnSummary, Dataset, inspect, layer_title};
use polars::prelude::*;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::CommandResult;
use crate::state::AppState;

/// Rows shown by [`inspect_dataset`] when the caller does not ask otherwise.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// One loaded dataset as listed on the overview page.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    pub name: String,
    pub kind: &'static str,
    pub rows: usize,
    pub columns: usize,
    /// Layers only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

/// A source that did not load.
#[derive(Debug, Clone, Serialize)]
pub struct FailureInfo {
    pub dataset: String,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetListing {
    pub datasets: Vec<DatasetInfo>,
    pub failures: Vec<FailureInfo>,
}

/// Shape, column summary and first rows of one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetPreview {
    pub name: String,
    pub kind: &'static str,
    pub summary: ColumnSummary,
    pub rows: Vec<Map<String, Value>>,
}

/// List every loaded dataset and every load failure.
pub fn list_datasets(state: &AppState) -> DatasetListing {
    let datasets = state
        .registry
        .iter()
        .map(|(name, dataset)| describe_dataset(name, dataset, &state.config.region))
        .collect();

    let failures = state
        .load_failures
        .iter()
        .map(|failure| FailureInfo {
            dataset: failure.dataset.clone(),
            code: failure.error.error_code(),
            message: failure.error.to_string(),
        })
        .collect();

    DatasetListing { datasets, failures }
}

fn describe_dataset(name: &str, dataset: &Dataset, region: &str) -> DatasetInfo {
    let (rows, columns) = dataset.table().shape();
    let layer = dataset.layer();
    DatasetInfo {
        name: name.to_string(),
        kind: dataset.kind_label(),
        rows,
        columns,
        crs: dataset.crs().map(ToString::to_string),
        title: layer.map(|_| layer_title(name, region)),
        bounding_box: layer.and_then(|l| l.bounding_box()),
    }
}

/// Summarize a registry dataset without creating a working copy.
///
/// Layers are shown through their attribute table.
pub fn inspect_dataset(state: &AppState, name: &str, preview_rows: usize) -> CommandResult<DatasetPreview> {
    let dataset = state.registry.dataset(name)?;
    let table = dataset.table();
    Ok(DatasetPreview {
        name: name.to_string(),
        kind: dataset.kind_label(),
        summary: inspect(table)?,
        rows: preview_records(table, preview_rows)?,
    })
}

/// First `limit` rows as JSON objects keyed by column name.
pub fn preview_records(df: &DataFrame, limit: usize) -> CommandResult<Vec<Map<String, Value>>> {
    let head = df.head(Some(limit));
    let mut records = Vec::with_capacity(head.height());
    for row in 0..head.height() {
        let mut record = Map::new();
        for column in head.get_columns() {
            let value = column.get(row)?;
            record.insert(column.name().to_string(), any_value_to_json(value));
        }
        records.push(record);
    }
    Ok(records)
}

/// Converts a Polars `AnyValue` to a JSON `Value`.
///
/// NaN and infinite floats become `null`; dates and other logical types use
/// their display form.
pub fn any_value_to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::Int8(i) => Value::Number(i.into()),
        AnyValue::Int16(i) => Value::Number(i.into()),
        AnyValue::Int32(i) => Value::Number(i.into()),
        AnyValue::Int64(i) => Value::Number(i.into()),
        AnyValue::UInt8(u) => Value::Number(u.into()),
        AnyValue::UInt16(u) => Value::Number(u.into()),
        AnyValue::UInt32(u) => Value::Number(u.into()),
        AnyValue::UInt64(u) => Value::Number(u.into()),
        AnyValue::Float32(f) => Number::from_f64(f as f64).map_or(Value::Null, Value::Number),
        AnyValue::Float64(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        other => Value::String(other.to_string()),
    }
}
