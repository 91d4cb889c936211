//! Readers for tabular sources: CSV files and spreadsheet workbooks.

use calamine::{Data, Reader, open_workbook_auto};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

use super::cells::{CellValue, frame_from_columns, unique_headers};
use crate::error::{PreprocessingError, Result, ResultExt};

/// Rows sampled by the CSV reader for schema inference.
const INFER_SCHEMA_ROWS: usize = 100;

/// Days between the spreadsheet epoch (1899-12-30) and 1970-01-01.
const SPREADSHEET_EPOCH_OFFSET_DAYS: f64 = 25_569.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

// =============================================================================
// CSV
// =============================================================================

/// Load a CSV file with a header row.
///
/// Quoted fields follow RFC 4180: a doubled quote inside quotes is one
/// literal quote. A malformed file fails the load rather than being patched.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PreprocessingError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .context(format!("reading CSV {}", path.display()))?;

    debug!("Read {} ({} rows)", path.display(), df.height());
    Ok(df)
}

// =============================================================================
// Spreadsheets
// =============================================================================

/// Load the first worksheet of a workbook, using its first row as header.
pub fn read_spreadsheet(path: &Path) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| PreprocessingError::Io(std::io::Error::other(e.to_string())))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| PreprocessingError::InvalidConfig("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| PreprocessingError::Io(std::io::Error::other(e.to_string())))?;

    debug!(
        "Reading sheet '{}' of {} ({} rows)",
        sheet_name,
        path.display(),
        range.height()
    );

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(DataFrame::empty());
    };

    let headers = unique_headers(header_row.iter().map(|cell| match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }));
    let mut columns: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];

    for row in rows {
        for (index, column) in columns.iter_mut().enumerate() {
            column.push(row.get(index).map(cell_value).unwrap_or(CellValue::Empty));
        }
    }

    frame_from_columns(headers.into_iter().zip(columns).collect()).map_err(Into::into)
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Int(v) => CellValue::Int(*v),
        Data::Float(v) => CellValue::Float(*v),
        Data::Bool(v) => CellValue::Bool(*v),
        Data::String(v) if v.trim().is_empty() => CellValue::Empty,
        Data::String(v) => CellValue::Text(v.clone()),
        Data::DateTime(dt) => CellValue::DateTime(serial_to_millis(dt.as_f64())),
        Data::DateTimeIso(v) | Data::DurationIso(v) => CellValue::Text(v.clone()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

/// Convert a spreadsheet serial date (days since 1899-12-30) to epoch millis.
fn serial_to_millis(serial: f64) -> i64 {
    ((serial - SPREADSHEET_EPOCH_OFFSET_DAYS) * MILLIS_PER_DAY).round() as i64
}
