//! Missing-value resolution.
//!
//! A [`MissingStrategy`] is applied to a whole table at once:
//! - drop every row or every column holding a missing value
//! - fill numeric columns with their mean or median
//! - fill every column with its mode

mod statistical;

pub use statistical::StatisticalImputer;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{PreprocessingError, Result};
use crate::utils::{is_numeric_dtype, missing_count, missing_mask};

/// How missing values are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Leave the table unchanged.
    #[default]
    None,
    /// Remove rows with at least one missing value.
    DropRows,
    /// Remove columns with at least one missing value.
    DropColumns,
    /// Fill numeric columns with their mean.
    FillMean,
    /// Fill numeric columns with their median.
    FillMedian,
    /// Fill every column with its most frequent value.
    FillMode,
}

impl MissingStrategy {
    pub const ALL: [MissingStrategy; 6] = [
        MissingStrategy::None,
        MissingStrategy::DropRows,
        MissingStrategy::DropColumns,
        MissingStrategy::FillMean,
        MissingStrategy::FillMedian,
        MissingStrategy::FillMode,
    ];

    /// Menu label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            MissingStrategy::None => "None",
            MissingStrategy::DropRows => "Drop rows",
            MissingStrategy::DropColumns => "Drop columns",
            MissingStrategy::FillMean => "Fill with mean",
            MissingStrategy::FillMedian => "Fill with median",
            MissingStrategy::FillMode => "Fill with mode",
        }
    }
}

impl fmt::Display for MissingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MissingStrategy {
    type Err = String;

    /// Accepts menu labels ("Fill with mean") and identifiers
    /// ("fill_mean", "fill-mean", "mean").
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();
        match key.as_str() {
            "none" | "" => Ok(MissingStrategy::None),
            "drop_rows" | "droprows" => Ok(MissingStrategy::DropRows),
            "drop_columns" | "dropcolumns" | "drop_cols" => Ok(MissingStrategy::DropColumns),
            "fill_with_mean" | "fill_mean" | "fillmean" | "mean" => Ok(MissingStrategy::FillMean),
            "fill_with_median" | "fill_median" | "fillmedian" | "median" => {
                Ok(MissingStrategy::FillMedian)
            }
            "fill_with_mode" | "fill_mode" | "fillmode" | "mode" => Ok(MissingStrategy::FillMode),
            _ => Err(format!("unknown missing value strategy '{}'", s.trim())),
        }
    }
}

/// Apply a strategy to a copy of `df`.
///
/// Any failure comes back as a strategy error and the input is untouched.
pub fn apply_strategy(df: &DataFrame, strategy: MissingStrategy) -> Result<DataFrame> {
    let mut steps = Vec::new();
    resolve_missing(df, strategy, &mut steps)
}

/// Apply a strategy, recording a human readable line per change.
pub fn resolve_missing(
    df: &DataFrame,
    strategy: MissingStrategy,
    processing_steps: &mut Vec<String>,
) -> Result<DataFrame> {
    debug!("Applying missing value strategy '{}'", strategy);
    let result = match strategy {
        MissingStrategy::None => Ok(df.clone()),
        MissingStrategy::DropRows => drop_rows(df, processing_steps),
        MissingStrategy::DropColumns => drop_columns(df, processing_steps),
        MissingStrategy::FillMean | MissingStrategy::FillMedian => {
            fill_numeric(df, strategy, processing_steps)
        }
        MissingStrategy::FillMode => fill_mode(df, processing_steps),
    };

    result.map_err(|e| match e {
        PreprocessingError::Strategy { .. } => e,
        other => PreprocessingError::Strategy {
            strategy: strategy.label().to_string(),
            reason: other.to_string(),
        },
    })
}

fn drop_rows(df: &DataFrame, processing_steps: &mut Vec<String>) -> Result<DataFrame> {
    let mut keep = vec![true; df.height()];
    for column in df.get_columns() {
        let mask = missing_mask(column.as_materialized_series())?;
        for (flag, missing) in keep.iter_mut().zip(mask) {
            *flag &= !missing;
        }
    }

    let filtered = df.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;
    let dropped = df.height() - filtered.height();
    if dropped > 0 {
        info!("Dropped {} rows with missing values", dropped);
        processing_steps.push(format!("Dropped {} rows with missing values", dropped));
    }
    Ok(filtered)
}

fn drop_columns(df: &DataFrame, processing_steps: &mut Vec<String>) -> Result<DataFrame> {
    let mut keep = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        if missing_count(column.as_materialized_series())? > 0 {
            processing_steps.push(format!("Dropped column '{}'", column.name()));
        } else {
            keep.push(column.name().clone());
        }
    }

    if keep.len() < df.width() {
        info!("Dropped {} columns with missing values", df.width() - keep.len());
    }
    Ok(df.select(keep)?)
}

fn fill_numeric(
    df: &DataFrame,
    strategy: MissingStrategy,
    processing_steps: &mut Vec<String>,
) -> Result<DataFrame> {
    let mut result = df.clone();
    let numeric: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| c.name().to_string())
        .collect();

    for name in &numeric {
        if strategy == MissingStrategy::FillMean {
            StatisticalImputer::apply_numeric_mean(&mut result, name, processing_steps)?;
        } else {
            StatisticalImputer::apply_numeric_median(&mut result, name, processing_steps)?;
        }
    }
    Ok(result)
}

fn fill_mode(df: &DataFrame, processing_steps: &mut Vec<String>) -> Result<DataFrame> {
    if df.height() == 0 && df.width() > 0 {
        return Err(PreprocessingError::Strategy {
            strategy: MissingStrategy::FillMode.label().to_string(),
            reason: "the table has no rows to take a mode from".to_string(),
        });
    }

    let mut result = df.clone();
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    for name in &names {
        StatisticalImputer::apply_mode_imputation(&mut result, name, processing_steps)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stations() -> DataFrame {
        df![
            "Station" => [Some("A"), Some("B"), None, Some("D"), Some("E")],
            "Rain" => [Some(1.0), None, Some(3.0), None, Some(5.0)],
            "Year" => [2019i64, 2020, 2021, 2022, 2023],
        ]
        .unwrap()
    }

    #[test]
    fn test_strategy_parsing() {
        for strategy in MissingStrategy::ALL {
            assert_eq!(strategy.label().parse::<MissingStrategy>(), Ok(strategy));
        }
        assert_eq!("fill-median".parse(), Ok(MissingStrategy::FillMedian));
        assert_eq!("drop_columns".parse(), Ok(MissingStrategy::DropColumns));
        assert!("interpolate".parse::<MissingStrategy>().is_err());
    }

    #[test]
    fn test_none_is_noop() {
        let df = stations();
        let result = apply_strategy(&df, MissingStrategy::None).unwrap();
        assert!(result.equals_missing(&df));
    }

    #[test]
    fn test_drop_rows_removes_all_missing() {
        let df = stations();
        let result = apply_strategy(&df, MissingStrategy::DropRows).unwrap();
        assert_eq!(result.height(), 2);
        for column in result.get_columns() {
            assert_eq!(missing_count(column.as_materialized_series()).unwrap(), 0);
        }
    }

    #[test]
    fn test_drop_columns_keeps_complete_columns() {
        let df = df![
            "Station" => ["A", "B", "C", "D", "E"],
            "Rain" => [Some(1.0), None, Some(3.0), None, Some(5.0)],
        ]
        .unwrap();
        let result = apply_strategy(&df, MissingStrategy::DropColumns).unwrap();
        assert_eq!(result.get_column_names(), vec!["Station"]);
        assert_eq!(result.height(), 5);
        assert!(
            result
                .column("Station")
                .unwrap()
                .as_materialized_series()
                .equals(df.column("Station").unwrap().as_materialized_series())
        );
    }

    #[test]
    fn test_fill_mean_leaves_strings() {
        let result = apply_strategy(&stations(), MissingStrategy::FillMean).unwrap();
        let rain: Vec<_> = result.column("Rain").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(rain, vec![Some(1.0), Some(3.0), Some(3.0), Some(3.0), Some(5.0)]);
        assert_eq!(result.column("Station").unwrap().null_count(), 1);
        assert_eq!(result.column("Year").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_fill_mode_covers_every_column() {
        let result = apply_strategy(&stations(), MissingStrategy::FillMode).unwrap();
        for column in result.get_columns() {
            assert_eq!(column.null_count(), 0, "column {}", column.name());
        }
        assert_eq!(result.column("Station").unwrap().str().unwrap().get(2), Some("A"));
    }

    #[test]
    fn test_fill_mode_skips_blank_column() {
        let df = df![
            "Station" => [Some("A"), None, Some("A")],
            "Blank" => [Option::<f64>::None, None, None],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let result = resolve_missing(&df, MissingStrategy::FillMode, &mut steps).unwrap();
        let station: Vec<_> = result.column("Station").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(station, vec![Some("A"), Some("A"), Some("A")]);
        assert_eq!(result.column("Blank").unwrap().null_count(), 3);
        assert!(steps.iter().any(|s| s.starts_with("Left 'Blank' unchanged")));
    }

    #[test]
    fn test_fill_mode_on_empty_table_is_strategy_error() {
        let df = stations().head(Some(0));
        let result = apply_strategy(&df, MissingStrategy::FillMode);
        assert!(matches!(result, Err(PreprocessingError::Strategy { .. })));
    }

    #[test]
    fn test_steps_are_recorded() {
        let mut steps = Vec::new();
        resolve_missing(&stations(), MissingStrategy::DropColumns, &mut steps).unwrap();
        assert_eq!(
            steps,
            vec!["Dropped column 'Station'".to_string(), "Dropped column 'Rain'".to_string()]
        );
    }
}
