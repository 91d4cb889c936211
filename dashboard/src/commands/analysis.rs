//! Exploratory analysis commands.
//!
//! Analysis only reads processed datasets. Every helper is a pure function of
//! a `DataFrame`, and [`run_analysis`] assembles them into one report for
//! the page.

use climate_processing::utils::{
    is_datetime_dtype, is_numeric_dtype, mean_of, missing_count, present_f64_values,
    quantile_sorted,
};
use climate_processing::{ColumnType, PreprocessingError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use super::datasets::any_value_to_json;
use crate::error::{CommandError, CommandResult};
use crate::state::{
    AnalysisReport, AppState, BoxPlotSummary, ColumnDescription, HeatmapMatrix, HistogramBin,
    LinePoint, LineSeries,
};

/// Bins used when a histogram request does not name a count.
pub const DEFAULT_HISTOGRAM_BINS: usize = 24;

pub const NO_NUMERIC_COLUMNS: &str = "No numeric columns available for analysis.";
pub const NOT_ENOUGH_FOR_CORRELATION: &str =
    "Not enough numeric columns for correlation heatmap.";

/// Charts to draw on top of the always-present description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisRequest {
    /// Processed dataset to analyze; the first processed one when omitted.
    pub dataset: Option<String>,
    pub histogram: Option<String>,
    pub bins: Option<usize>,
    pub box_plot: Option<String>,
    pub line: Option<LineRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRequest {
    pub x: String,
    pub y: String,
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Processed table to analyze, by name or the first one available.
pub fn processed_table(state: &AppState, dataset: Option<&str>) -> CommandResult<(String, DataFrame)> {
    let session = state.session.read();
    let names = session.processed_names();
    let Some(first) = names.first() else {
        return Err(CommandError::NoProcessedData);
    };
    let name = dataset.unwrap_or(*first).to_string();
    let table = session.processed(&name)?.clone();
    Ok((name, table))
}

/// Build the analysis page for one processed dataset.
///
/// Missing numeric columns and a too-small correlation matrix are reported
/// as notes, not errors. A chart request naming a bad column is an error.
pub fn run_analysis(state: &AppState, request: &AnalysisRequest) -> CommandResult<AnalysisReport> {
    let (dataset, df) = processed_table(state, request.dataset.as_deref())?;
    debug!("Analyzing '{}' ({}x{})", dataset, df.height(), df.width());

    let numeric = numeric_columns(&df);
    let mut notes = Vec::new();
    if numeric.is_empty() {
        notes.push(NO_NUMERIC_COLUMNS.to_string());
    }

    let histogram = match &request.histogram {
        Some(column) => Some(histogram(
            &df,
            column,
            request.bins.unwrap_or(DEFAULT_HISTOGRAM_BINS),
        )?),
        None => None,
    };
    let box_plot = match &request.box_plot {
        Some(column) => Some(box_plot(&df, column)?),
        None => None,
    };
    let line = match &request.line {
        Some(line) => Some(line_series(&df, &line.x, &line.y)?),
        None => None,
    };

    let correlation = if numeric.len() > 1 {
        Some(correlation_matrix(&df)?)
    } else {
        if !numeric.is_empty() {
            notes.push(NOT_ENOUGH_FOR_CORRELATION.to_string());
        }
        None
    };

    Ok(AnalysisReport {
        dataset,
        rows: df.height(),
        columns: df.width(),
        description: describe(&df)?,
        numeric_columns: numeric,
        histogram,
        box_plot,
        line,
        correlation,
        notes,
    })
}

// ============================================================================
// DESCRIPTION
// ============================================================================

/// Numeric columns in table order. Booleans are not numeric here.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|column| is_numeric_dtype(column.dtype()))
        .map(|column| column.name().to_string())
        .collect()
}

/// Per-column summary in the layout of `describe(include="all")`.
pub fn describe(df: &DataFrame) -> CommandResult<Vec<ColumnDescription>> {
    df.get_columns()
        .iter()
        .map(|column| describe_series(column.as_materialized_series()))
        .collect()
}

fn describe_series(series: &Series) -> CommandResult<ColumnDescription> {
    let missing = missing_count(series)?;
    let mut description = ColumnDescription {
        column: series.name().to_string(),
        dtype: ColumnType::label_for(series.dtype()),
        count: series.len() - missing,
        missing,
        unique: None,
        top: None,
        freq: None,
        mean: None,
        std: None,
        min: None,
        p25: None,
        p50: None,
        p75: None,
        max: None,
    };

    if is_numeric_dtype(series.dtype()) {
        let mut values = present_f64_values(series)?;
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        if !values.is_empty() {
            description.mean = mean_of(&values);
            description.std = sample_std(&values);
            description.min = values.first().copied();
            description.p25 = Some(quantile_sorted(&values, 0.25));
            description.p50 = Some(quantile_sorted(&values, 0.5));
            description.p75 = Some(quantile_sorted(&values, 0.75));
            description.max = values.last().copied();
        }
    } else {
        let (unique, top) = value_counts(series)?;
        description.unique = Some(unique);
        if let Some((value, freq)) = top {
            description.top = Some(value);
            description.freq = Some(freq);
        }
    }
    Ok(description)
}

/// Standard deviation with `n - 1` in the denominator; `None` below two values.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean_of(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Distinct non-missing values and the most frequent one.
///
/// Ties go to the value seen first.
fn value_counts(series: &Series) -> PolarsResult<(usize, Option<(String, usize)>)> {
    let text = series.cast(&DataType::String)?;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for value in text.str()?.into_iter().flatten() {
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    let mut top: Option<(&str, usize)> = None;
    for value in &order {
        let count = counts[value];
        if top.is_none_or(|(_, best)| count > best) {
            top = Some((*value, count));
        }
    }
    Ok((order.len(), top.map(|(value, count)| (value.to_string(), count))))
}

// ============================================================================
// CHARTS
// ============================================================================

/// Equal-width histogram of a numeric column, missing values dropped.
///
/// A column with a single distinct value gets one bin.
pub fn histogram(df: &DataFrame, column: &str, bins: usize) -> CommandResult<Vec<HistogramBin>> {
    if bins == 0 {
        return Err(CommandError::Analysis(
            "a histogram needs at least one bin".to_string(),
        ));
    }
    let mut values = numeric_values(df, column)?;
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Ok(build_histogram(&values, bins))
}

fn build_histogram(sorted: &[f64], bins: usize) -> Vec<HistogramBin> {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    if (max - min).abs() < f64::EPSILON {
        return vec![HistogramBin {
            start: min,
            end: max,
            count: sorted.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in sorted {
        let index = (((value - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| HistogramBin {
            start: min + index as f64 * width,
            end: min + (index as f64 + 1.0) * width,
            count,
        })
        .collect()
}

/// Quartiles, Tukey whiskers and outlier count of a numeric column.
pub fn box_plot(df: &DataFrame, column: &str) -> CommandResult<BoxPlotSummary> {
    let mut values = numeric_values(df, column)?;
    if values.is_empty() {
        return Err(CommandError::Analysis(format!(
            "column '{}' has no values to plot",
            column
        )));
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let q1 = quantile_sorted(&values, 0.25);
    let q3 = quantile_sorted(&values, 0.75);
    let iqr = q3 - q1;
    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let within = |v: &f64| *v >= lower_fence && *v <= upper_fence;
    let lower_whisker = values.iter().copied().find(within).unwrap_or(q1);
    let upper_whisker = values.iter().rev().copied().find(within).unwrap_or(q3);
    let outliers = values.iter().filter(|v| !within(*v)).count();

    Ok(BoxPlotSummary {
        min: values[0],
        q1,
        median: quantile_sorted(&values, 0.5),
        q3,
        max: values[values.len() - 1],
        lower_whisker,
        upper_whisker,
        outliers,
    })
}

/// `y` against `x`, rows sorted by `x`.
///
/// `x` may be any column; `y` must be numeric. Numeric and temporal `x`
/// values sort by value, everything else by text, and missing `x` values
/// go last. Rows with equal `x` keep their table order.
pub fn line_series(df: &DataFrame, x: &str, y: &str) -> CommandResult<LineSeries> {
    let x_series = series(df, x)?;
    let y_series = series(df, y)?;
    require_numeric(y_series)?;

    let keys = sort_keys(x_series)?;
    let y_values = y_series.cast(&DataType::Float64)?;
    let y_values: Vec<Option<f64>> = y_values
        .f64()?
        .into_iter()
        .map(|v| v.filter(|v| !v.is_nan()))
        .collect();

    let mut order: Vec<usize> = (0..df.height()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

    let mut points = Vec::with_capacity(order.len());
    for index in order {
        points.push(LinePoint {
            x: any_value_to_json(x_series.get(index)?),
            y: y_values[index],
        });
    }
    Ok(LineSeries {
        x: x.to_string(),
        y: y.to_string(),
        points,
    })
}

#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
    Missing,
}

impl SortKey {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Number(_) => 0,
            SortKey::Text(_) => 1,
            SortKey::Missing => 2,
        }
    }

    fn cmp(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn sort_keys(series: &Series) -> PolarsResult<Vec<SortKey>> {
    let dtype = series.dtype();
    let by_value = is_numeric_dtype(dtype)
        || is_datetime_dtype(dtype)
        || matches!(dtype, DataType::Duration(_) | DataType::Boolean);

    if by_value {
        let floats = series.to_physical_repr().cast(&DataType::Float64)?;
        Ok(floats
            .f64()?
            .into_iter()
            .map(|v| match v {
                Some(v) if !v.is_nan() => SortKey::Number(v),
                _ => SortKey::Missing,
            })
            .collect())
    } else {
        let text = series.cast(&DataType::String)?;
        Ok(text
            .str()?
            .into_iter()
            .map(|v| v.map_or(SortKey::Missing, |s| SortKey::Text(s.to_string())))
            .collect())
    }
}

// ============================================================================
// CORRELATION
// ============================================================================

/// Pearson correlation between every pair of numeric columns.
///
/// Each pair uses the rows where both values are present.
pub fn correlation_matrix(df: &DataFrame) -> CommandResult<HeatmapMatrix> {
    let labels = numeric_columns(df);
    if labels.len() < 2 {
        return Err(CommandError::Analysis(NOT_ENOUGH_FOR_CORRELATION.to_string()));
    }

    let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(labels.len());
    for name in &labels {
        let floats = series(df, name)?.cast(&DataType::Float64)?;
        columns.push(
            floats
                .f64()?
                .into_iter()
                .map(|v| v.filter(|v| !v.is_nan()))
                .collect(),
        );
    }

    let size = labels.len();
    let mut values = vec![vec![None; size]; size];
    for i in 0..size {
        for j in i..size {
            let estimate = pearson(&columns[i], &columns[j]);
            let estimate = if i == j { estimate.map(|_| 1.0) } else { estimate };
            values[i][j] = estimate;
            values[j][i] = estimate;
        }
    }

    Ok(HeatmapMatrix { labels, values })
}

fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|pair| match pair {
            (Some(a), Some(b)) => Some((*a, *b)),
            _ => None,
        })
        .unzip();
    if xs.len() < 2 {
        return None;
    }

    let mean_x = mean_of(&xs)?;
    let mean_y = mean_of(&ys)?;
    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in xs.iter().zip(&ys) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some((covariance / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

// ============================================================================
// HELPERS
// ============================================================================

fn series<'a>(df: &'a DataFrame, name: &str) -> CommandResult<&'a Series> {
    df.column(name)
        .map(Column::as_materialized_series)
        .map_err(|_| PreprocessingError::ColumnNotFound(name.to_string()).into())
}

fn require_numeric(series: &Series) -> CommandResult<()> {
    if is_numeric_dtype(series.dtype()) {
        Ok(())
    } else {
        Err(CommandError::Analysis(format!(
            "column '{}' is not numeric ({})",
            series.name(),
            series.dtype()
        )))
    }
}

fn numeric_values(df: &DataFrame, column: &str) -> CommandResult<Vec<f64>> {
    let series = series(df, column)?;
    require_numeric(series)?;
    Ok(present_f64_values(series)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use climate_processing::{Dataset, DatasetRegistry};
    use pretty_assertions::assert_eq;

    fn climate() -> DataFrame {
        df![
            "District" => ["Kaski", "Jumla", "Ilam", "Kaski", "Dang"],
            "Month" => [3i64, 1, 2, 5, 4],
            "Temp" => [Some(18.0), Some(2.0), None, Some(22.0), Some(27.0)],
            "Rain" => [Some(40.0), Some(20.0), Some(30.0), None, Some(60.0)],
        ]
        .unwrap()
    }

    fn processed_state(df: DataFrame) -> AppState {
        let mut registry = DatasetRegistry::default();
        registry.insert("Climate", Dataset::Tabular(df));
        let state = AppState::with_registry(DashboardConfig::default(), registry);
        {
            let mut session = state.session.write();
            session.select_dataset(&state.registry, "Climate").unwrap();
            session.complete_preprocessing("Climate").unwrap();
        }
        state
    }

    #[test]
    fn test_analysis_requires_processed_data() {
        let state = AppState::with_registry(DashboardConfig::default(), DatasetRegistry::default());
        let err = run_analysis(&state, &AnalysisRequest::default()).unwrap_err();
        assert!(matches!(err, CommandError::NoProcessedData));
        assert!(err.to_string().contains("complete data preprocessing first"));
    }

    #[test]
    fn test_describe_numeric_and_text() {
        let description = describe(&climate()).unwrap();

        let district = &description[0];
        assert_eq!(district.count, 5);
        assert_eq!(district.unique, Some(4));
        assert_eq!(district.top.as_deref(), Some("Kaski"));
        assert_eq!(district.freq, Some(2));
        assert_eq!(district.mean, None);

        let temp = &description[2];
        assert_eq!(temp.count, 4);
        assert_eq!(temp.missing, 1);
        assert_eq!(temp.mean, Some(17.25));
        assert_eq!(temp.min, Some(2.0));
        assert_eq!(temp.p50, Some(20.0));
        assert_eq!(temp.max, Some(27.0));
        assert!((temp.std.unwrap() - 10.812_801_055_539_063).abs() < 1e-9);
        assert_eq!(temp.unique, None);
    }

    #[test]
    fn test_top_value_tie_keeps_first_seen() {
        let df = df!["Station" => ["B", "A", "A", "B"]].unwrap();
        let description = describe(&df).unwrap();
        assert_eq!(description[0].top.as_deref(), Some("B"));
    }

    #[test]
    fn test_numeric_columns_skip_text_and_bool() {
        let df = df![
            "District" => ["a"],
            "Flag" => [true],
            "Temp" => [1.0],
        ]
        .unwrap();
        assert_eq!(numeric_columns(&df), vec!["Temp".to_string()]);
    }

    #[test]
    fn test_histogram_counts_present_values() {
        let bins = histogram(&climate(), "Temp", 5).unwrap();
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(bins[0].start, 2.0);
        assert_eq!(bins[4].end, 27.0);
        assert_eq!(bins[3].count, 1);
        assert_eq!(bins[4].count, 2);
    }

    #[test]
    fn test_histogram_constant_column_has_one_bin() {
        let df = df!["Temp" => [5.0, 5.0, 5.0]].unwrap();
        let bins = histogram(&df, "Temp", DEFAULT_HISTOGRAM_BINS).unwrap();
        assert_eq!(
            bins,
            vec![HistogramBin {
                start: 5.0,
                end: 5.0,
                count: 3
            }]
        );
    }

    #[test]
    fn test_histogram_rejects_text_column() {
        let err = histogram(&climate(), "District", 10).unwrap_err();
        assert!(matches!(err, CommandError::Analysis(_)));
    }

    #[test]
    fn test_box_plot_with_outlier() {
        let df = df!["Rain" => [1.0, 2.0, 3.0, 4.0, 100.0]].unwrap();
        let summary = box_plot(&df, "Rain").unwrap();
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.upper_whisker, 4.0);
        assert_eq!(summary.max, 100.0);
        assert_eq!(summary.outliers, 1);
    }

    #[test]
    fn test_line_series_sorted_by_x() {
        let line = line_series(&climate(), "Month", "Temp").unwrap();
        let months: Vec<i64> = line.points.iter().map(|p| p.x.as_i64().unwrap()).collect();
        assert_eq!(months, vec![1, 2, 3, 4, 5]);
        assert_eq!(line.points[0].y, Some(2.0));
        assert_eq!(line.points[1].y, None);
    }

    #[test]
    fn test_line_series_text_x_is_stable() {
        let line = line_series(&climate(), "District", "Rain").unwrap();
        let rain: Vec<Option<f64>> = line.points.iter().map(|p| p.y).collect();
        // Dang, Ilam, Jumla, Kaski (40), Kaski (missing)
        assert_eq!(rain, vec![Some(60.0), Some(30.0), Some(20.0), Some(40.0), None]);
    }

    #[test]
    fn test_correlation_matrix() {
        let df = df![
            "a" => [1.0, 2.0, 3.0, 4.0],
            "b" => [2.0, 4.0, 6.0, 8.0],
            "c" => [4.0, 3.0, 2.0, 1.0],
            "d" => [7.0, 7.0, 7.0, 7.0],
        ]
        .unwrap();
        let matrix = correlation_matrix(&df).unwrap();
        assert_eq!(matrix.labels, vec!["a", "b", "c", "d"]);
        assert_eq!(matrix.values[0][0], Some(1.0));
        assert!((matrix.values[0][1].unwrap() - 1.0).abs() < 1e-12);
        assert!((matrix.values[0][2].unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(matrix.values[0][3], None);
        assert_eq!(matrix.values[3][3], None);
    }

    #[test]
    fn test_correlation_needs_two_numeric_columns() {
        let df = df!["District" => ["a", "b"], "Temp" => [1.0, 2.0]].unwrap();
        assert!(correlation_matrix(&df).is_err());
    }

    #[test]
    fn test_run_analysis_report() {
        let state = processed_state(climate());
        let request = AnalysisRequest {
            histogram: Some("Rain".to_string()),
            box_plot: Some("Temp".to_string()),
            line: Some(LineRequest {
                x: "Month".to_string(),
                y: "Rain".to_string(),
            }),
            ..Default::default()
        };
        let report = run_analysis(&state, &request).unwrap();
        assert_eq!(report.dataset, "Climate");
        assert_eq!(report.description.len(), 4);
        assert_eq!(report.numeric_columns, vec!["Month", "Temp", "Rain"]);
        assert_eq!(report.histogram.as_ref().map(Vec::len), Some(DEFAULT_HISTOGRAM_BINS));
        assert!(report.correlation.is_some());
        assert!(report.notes.is_empty());
    }

    #[test]
    fn test_run_analysis_without_numeric_columns() {
        let state = processed_state(df!["District" => ["Kaski", "Ilam"]].unwrap());
        let report = run_analysis(&state, &AnalysisRequest::default()).unwrap();
        assert!(report.numeric_columns.is_empty());
        assert_eq!(report.notes, vec![NO_NUMERIC_COLUMNS.to_string()]);
        assert!(report.correlation.is_none());
    }
}
