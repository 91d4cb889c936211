//! Shared utilities for the preprocessing stages.
//!
//! This module contains dtype checks, missing-value masks and string parsing
//! helpers used by the inspector, the resolver and the coercion engine.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a floating point type.
#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType is a date or datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

// =============================================================================
// Missing Values
// =============================================================================

/// Per-row missing flags for a Series.
///
/// Nulls are missing for every dtype; NaN is missing for float columns.
pub fn missing_mask(series: &Series) -> PolarsResult<Vec<bool>> {
    if is_float_dtype(series.dtype()) {
        let floats = series.cast(&DataType::Float64)?;
        Ok(floats
            .f64()?
            .into_iter()
            .map(|value| value.is_none_or(|v| v.is_nan()))
            .collect())
    } else {
        Ok(series
            .is_null()
            .into_iter()
            .map(|flag| flag.unwrap_or(false))
            .collect())
    }
}

/// Number of missing entries in a Series.
pub fn missing_count(series: &Series) -> PolarsResult<usize> {
    if is_float_dtype(series.dtype()) {
        Ok(missing_mask(series)?.into_iter().filter(|m| *m).count())
    } else {
        Ok(series.null_count())
    }
}

/// Non-missing values of a numeric Series as f64, in column order.
pub fn present_f64_values(series: &Series) -> PolarsResult<Vec<f64>> {
    let floats = series.cast(&DataType::Float64)?;
    Ok(floats
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect())
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Arithmetic mean of a slice, `None` when empty.
pub fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Median of a slice (average of the two middle values for even lengths).
pub fn median_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Linear-interpolated quantile over an already sorted slice.
pub fn quantile_sorted(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let position = quantile.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = position - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Common boolean true representations.
pub const BOOLEAN_TRUE_VALUES: [&str; 8] =
    ["true", "yes", "1", "t", "y", "on", "enabled", "active"];

/// Common boolean false representations.
pub const BOOLEAN_FALSE_VALUES: [&str; 8] =
    ["false", "no", "0", "f", "n", "off", "disabled", "inactive"];

/// Parse a string into a boolean using the boolean vocabulary.
pub fn parse_boolean_string(s: &str) -> Option<bool> {
    let lower = s.trim().to_ascii_lowercase();
    if BOOLEAN_TRUE_VALUES.iter().any(|&v| v == lower) {
        Some(true)
    } else if BOOLEAN_FALSE_VALUES.iter().any(|&v| v == lower) {
        Some(false)
    } else {
        None
    }
}

/// Human-readable table shape, e.g. "24 rows × 3 columns".
pub fn shape_label(df: &DataFrame) -> String {
    format!("{} rows × {} columns", df.height(), df.width())
}

/// Columns that would be collapsed by a melt with the given id columns.
pub fn meltable_columns(df: &DataFrame, id_columns: &[String]) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .filter(|name| !id_columns.iter().any(|id| id.as_str() == name.as_str()))
        .map(|name| name.to_string())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
