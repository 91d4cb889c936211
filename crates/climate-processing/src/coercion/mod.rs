//! Type coercion engine.
//!
//! Converts the columns named in a mapping to their target [`ColumnType`].
//! Coercion is all-or-nothing: every conversion is computed on a copy, and the
//! copy is only returned when all of them succeed.

mod converters;

use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{PreprocessingError, Result};
use crate::types::ColumnType;

/// Convert one Series to a target type.
pub fn convert_series(series: &Series, target: ColumnType) -> Result<Series> {
    match target {
        ColumnType::String => converters::to_string(series),
        ColumnType::Int64 => converters::to_int64(series),
        ColumnType::Float => converters::to_float(series),
        ColumnType::Boolean => converters::to_boolean(series),
        ColumnType::Category => converters::to_category(series),
        ColumnType::Datetime => converters::to_datetime(series),
        ColumnType::Duration => converters::to_duration(series),
        ColumnType::Object => converters::to_object(series),
    }
}

/// Apply a column → type mapping to a copy of `df`.
///
/// Columns missing from the mapping keep their type. Names in the mapping
/// that are not in the table fail before any conversion runs. Conversions
/// are applied in table order, so the first failing column is reported.
pub fn coerce(df: &DataFrame, column_to_type: &HashMap<String, ColumnType>) -> Result<DataFrame> {
    let columns = df.get_column_names();
    let mut unknown: Vec<&String> = column_to_type
        .keys()
        .filter(|name| !columns.iter().any(|c| c.as_str() == name.as_str()))
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        return Err(PreprocessingError::ColumnNotFound(unknown[0].clone()));
    }

    let mut result = df.clone();
    for column in df.get_columns() {
        let Some(target) = column_to_type.get(column.name().as_str()) else {
            continue;
        };
        let series = column.as_materialized_series();
        let converted = convert_series(series, *target)?;
        if converted.dtype() != series.dtype() {
            debug!(
                "Coerced '{}' from {} to {}",
                column.name(),
                series.dtype(),
                target
            );
        }
        result.replace(column.name().as_str(), converted)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::inspect;
    use pretty_assertions::assert_eq;

    fn report() -> DataFrame {
        df![
            "Year" => ["2019", "2020", "2021"],
            "Province" => ["Koshi", "Madhesh", "Koshi"],
            "Rain" => ["10.5", "", "7"],
        ]
        .unwrap()
    }

    fn mapping(pairs: &[(&str, ColumnType)]) -> HashMap<String, ColumnType> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_coerce_all_columns() {
        let result = coerce(
            &report(),
            &mapping(&[
                ("Year", ColumnType::Int64),
                ("Province", ColumnType::Category),
                ("Rain", ColumnType::Float),
            ]),
        )
        .unwrap();

        let summary = inspect(&result).unwrap();
        assert_eq!(summary.dtype_of("Year"), Some("int64"));
        assert_eq!(summary.dtype_of("Province"), Some("category"));
        assert_eq!(summary.dtype_of("Rain"), Some("float"));
        assert_eq!(summary.missing_of("Rain"), Some(1));
    }

    #[test]
    fn test_coerce_partial_mapping_keeps_other_columns() {
        let df = report();
        let result = coerce(&df, &mapping(&[("Year", ColumnType::Int64)])).unwrap();
        assert_eq!(result.column("Province").unwrap().dtype(), &DataType::String);
        assert_eq!(result.column("Year").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_coerce_is_all_or_nothing() {
        let df = report();
        let snapshot = df.clone();
        let err = coerce(
            &df,
            &mapping(&[
                ("Year", ColumnType::Int64),
                ("Province", ColumnType::Float),
            ]),
        )
        .unwrap_err();

        match err {
            PreprocessingError::Coercion { column, target_type, .. } => {
                assert_eq!(column, "Province");
                assert_eq!(target_type, "float");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(df.equals_missing(&snapshot));
    }

    #[test]
    fn test_coerce_unknown_column() {
        let result = coerce(&report(), &mapping(&[("Month", ColumnType::String)]));
        assert!(matches!(result, Err(PreprocessingError::ColumnNotFound(c)) if c == "Month"));
    }

    #[test]
    fn test_coerce_same_type_is_stable() {
        let df = report();
        let result = coerce(
            &df,
            &mapping(&[
                ("Year", ColumnType::String),
                ("Province", ColumnType::Object),
            ]),
        )
        .unwrap();
        assert!(result.equals_missing(&df));
    }
}
