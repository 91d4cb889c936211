//! Loosely typed cell values and column dtype inference.
//!
//! Spreadsheet cells and geospatial attributes arrive one value at a time with
//! their own type tag. Each column is collected as `CellValue`s and turned into
//! a single typed Series once every row has been read.

use chrono::DateTime;
use polars::prelude::*;

/// One cell as read from a spreadsheet or an attribute record.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// Milliseconds since the Unix epoch.
    DateTime(i64),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Int(v) => Some(v.to_string()),
            CellValue::Float(v) => Some(v.to_string()),
            CellValue::Bool(v) => Some(v.to_string()),
            CellValue::Text(v) => Some(v.clone()),
            CellValue::DateTime(ms) => Some(
                DateTime::from_timestamp_millis(*ms)
                    .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| ms.to_string()),
            ),
        }
    }
}

/// Column dtype chosen for a run of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inferred {
    Int,
    Float,
    Bool,
    DateTime,
    Text,
}

fn infer(cells: &[CellValue]) -> Inferred {
    let mut inferred: Option<Inferred> = None;
    for cell in cells.iter().filter(|c| !c.is_empty()) {
        let kind = match cell {
            CellValue::Int(_) => Inferred::Int,
            CellValue::Float(_) => Inferred::Float,
            CellValue::Bool(_) => Inferred::Bool,
            CellValue::DateTime(_) => Inferred::DateTime,
            CellValue::Text(_) | CellValue::Empty => Inferred::Text,
        };
        inferred = Some(match (inferred, kind) {
            (None, kind) => kind,
            (Some(current), kind) if current == kind => current,
            (Some(Inferred::Int), Inferred::Float) | (Some(Inferred::Float), Inferred::Int) => {
                Inferred::Float
            }
            _ => return Inferred::Text,
        });
    }
    // An all-empty column reads as float, like an empty numeric CSV column.
    inferred.unwrap_or(Inferred::Float)
}

/// Build a typed Series from a column of cells.
///
/// Integers stay integers only when every present cell is an integer; mixing
/// integers and floats widens to Float64; any other mix falls back to String.
pub fn series_from_cells(name: &str, cells: &[CellValue]) -> PolarsResult<Series> {
    let series = match infer(cells) {
        Inferred::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| match c {
                    CellValue::Int(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        Inferred::Float => {
            let values: Vec<Option<f64>> = cells.iter().map(CellValue::as_f64).collect();
            Series::new(name.into(), values)
        }
        Inferred::Bool => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|c| match c {
                    CellValue::Bool(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        Inferred::DateTime => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| match c {
                    CellValue::DateTime(ms) => Some(*ms),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
        Inferred::Text => {
            let values: Vec<Option<String>> = cells.iter().map(CellValue::to_text).collect();
            Series::new(name.into(), values)
        }
    };
    Ok(series)
}

/// Make header names unique and non-empty.
///
/// Blank headers become `Unnamed: <index>`; repeats get a `.1`, `.2` suffix.
pub fn unique_headers(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for (index, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {index}")
        } else {
            name.trim().to_string()
        };
        let mut candidate = base.clone();
        let mut suffix = 1;
        while headers.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        headers.push(candidate);
    }
    headers
}

/// Assemble a DataFrame from named cell columns of equal length.
pub fn frame_from_columns(columns: Vec<(String, Vec<CellValue>)>) -> PolarsResult<DataFrame> {
    let series = columns
        .iter()
        .map(|(name, cells)| series_from_cells(name, cells).map(Column::from))
        .collect::<PolarsResult<Vec<_>>>()?;
    DataFrame::new(series)
}
