//! Statistical imputation methods.
//!
//! Provides mean, median and mode fills. Every method only touches the
//! positions reported missing by [`missing_mask`], so NaN in a float column
//! is filled like a null.

use polars::prelude::*;
use std::collections::HashMap;

use crate::error::Result;
use crate::utils::{is_numeric_dtype, mean_of, median_of, missing_mask, present_f64_values};

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill a numeric column with the mean of its present values.
    ///
    /// Non-numeric columns, columns without missing values and columns
    /// without any present value are left untouched.
    pub fn apply_numeric_mean(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        Self::apply_numeric_statistic(df, col_name, processing_steps, "mean", mean_of)
    }

    /// Fill a numeric column with the median of its present values.
    pub fn apply_numeric_median(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        Self::apply_numeric_statistic(df, col_name, processing_steps, "median", median_of)
    }

    fn apply_numeric_statistic(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
        method: &str,
        statistic: fn(&[f64]) -> Option<f64>,
    ) -> Result<()> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        if !is_numeric_dtype(series.dtype()) {
            return Ok(());
        }

        let mask = missing_mask(&series)?;
        if !mask.iter().any(|m| *m) {
            return Ok(());
        }

        let Some(fill_value) = statistic(&present_f64_values(&series)?) else {
            processing_steps.push(format!(
                "Left '{}' unchanged: no values to take a {} from",
                col_name, method
            ));
            return Ok(());
        };

        Self::fill_with_value(df, col_name, fill_value, &series, &mask)?;
        processing_steps.push(format!(
            "Filled '{}' with {}: {:.2}",
            col_name, method, fill_value
        ));
        Ok(())
    }

    /// Fill a column of any dtype with its most frequent present value.
    ///
    /// Ties go to the value seen first. The column keeps its dtype. A column
    /// with nothing present has no mode and is left unchanged.
    pub fn apply_mode_imputation(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let mask = missing_mask(&series)?;
        if !mask.iter().any(|m| *m) {
            return Ok(());
        }

        let Some(mode_index) = mode_position(&series, &mask)? else {
            processing_steps.push(format!(
                "Left '{}' unchanged: no values to take a mode from",
                col_name
            ));
            return Ok(());
        };

        let indices: Vec<IdxSize> = mask
            .iter()
            .enumerate()
            .map(|(i, missing)| (if *missing { mode_index } else { i }) as IdxSize)
            .collect();
        let filled = series.take(&IdxCa::from_vec(series.name().clone(), indices))?;
        let mode_value = series.get(mode_index)?;
        df.replace(col_name, filled)?;

        processing_steps.push(format!("Filled '{}' with mode: {}", col_name, mode_value));
        Ok(())
    }

    /// Replace the masked positions of a numeric column, producing Float64.
    fn fill_with_value(
        df: &mut DataFrame,
        col_name: &str,
        fill_value: f64,
        series: &Series,
        mask: &[bool],
    ) -> Result<()> {
        let floats = series.cast(&DataType::Float64)?;
        let result: Vec<Option<f64>> = floats
            .f64()?
            .into_iter()
            .zip(mask)
            .map(|(value, missing)| if *missing { Some(fill_value) } else { value })
            .collect();

        df.replace(col_name, Series::new(col_name.into(), result))?;
        Ok(())
    }
}

/// Row index of the first occurrence of the most frequent present value.
fn mode_position(series: &Series, mask: &[bool]) -> Result<Option<usize>> {
    // value rendering -> (count, first index)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (index, missing) in mask.iter().enumerate() {
        if *missing {
            continue;
        }
        let key = series.get(index)?.to_string();
        counts.entry(key).or_insert((0, index)).0 += 1;
    }

    Ok(counts
        .into_values()
        .max_by(|(count_a, first_a), (count_b, first_b)| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(_, first)| first))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // apply_numeric_mean() tests
    // ========================================================================

    #[test]
    fn test_apply_numeric_mean_basic() {
        let mut df = df![
            "values" => [Some(1.0), None, Some(3.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        StatisticalImputer::apply_numeric_mean(&mut df, "values", &mut steps).unwrap();

        let values: Vec<_> = df.column("values").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0)]);
        assert!(steps[0].contains("mean"));
    }

    #[test]
    fn test_apply_numeric_mean_integer_column_becomes_float() {
        let mut df = df![
            "values" => [Some(1i64), None, Some(4)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        StatisticalImputer::apply_numeric_mean(&mut df, "values", &mut steps).unwrap();

        let values = df.column("values").unwrap();
        assert_eq!(values.dtype(), &DataType::Float64);
        assert_eq!(values.get(1).unwrap().try_extract::<f64>().unwrap(), 2.5);
    }

    #[test]
    fn test_apply_numeric_mean_fills_nan() {
        let mut df = df![
            "values" => [2.0, f64::NAN, 4.0],
        ]
        .unwrap();
        let mut steps = Vec::new();

        StatisticalImputer::apply_numeric_mean(&mut df, "values", &mut steps).unwrap();

        let values = df.column("values").unwrap();
        assert_eq!(values.get(1).unwrap().try_extract::<f64>().unwrap(), 3.0);
    }

    #[test]
    fn test_apply_numeric_mean_skips_strings() {
        let mut df = df![
            "names" => [Some("a"), None],
        ]
        .unwrap();
        let mut steps = Vec::new();

        StatisticalImputer::apply_numeric_mean(&mut df, "names", &mut steps).unwrap();

        assert_eq!(df.column("names").unwrap().null_count(), 1);
        assert!(steps.is_empty());
    }

    #[test]
    fn test_apply_numeric_mean_all_missing_left_alone() {
        let mut df = df![
            "values" => [Option::<f64>::None, None],
        ]
        .unwrap();
        let mut steps = Vec::new();

        StatisticalImputer::apply_numeric_mean(&mut df, "values", &mut steps).unwrap();

        assert_eq!(df.column("values").unwrap().null_count(), 2);
        assert!(steps[0].contains("unchanged"));
    }

    #[test]
    fn test_apply_numeric_mean_no_missing_keeps_dtype() {
        let mut df = df![
            "values" => [1i64, 2, 3],
        ]
        .unwrap();
        let mut steps = Vec::new();

        StatisticalImputer::apply_numeric_mean(&mut df, "values", &mut steps).unwrap();

        assert_eq!(df.column("values").unwrap().dtype(), &DataType::Int64);
        assert!(steps.is_empty());
    }

    // ========================================================================
    // apply_numeric_median() tests
    // ========================================================================

    #[test]
    fn test_apply_numeric_median_basic() {
        let mut df = df![
            "values" => [Some(1.0), None, Some(3.0), None, Some(10.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        StatisticalImputer::apply_numeric_median(&mut df, "values", &mut steps).unwrap();

        let values = df.column("values").unwrap();
        assert_eq!(values.null_count(), 0);
        assert_eq!(values.get(1).unwrap().try_extract::<f64>().unwrap(), 3.0);
        assert_eq!(values.get(3).unwrap().try_extract::<f64>().unwrap(), 3.0);
    }

    // ========================================================================
    // apply_mode_imputation() tests
    // ========================================================================

    #[test]
    fn test_apply_mode_strings() {
        let mut df = df![
            "district" => [Some("Jumla"), Some("Dang"), None, Some("Dang")],
        ]
        .unwrap();
        let mut steps = Vec::new();

        StatisticalImputer::apply_mode_imputation(&mut df, "district", &mut steps).unwrap();

        let column = df.column("district").unwrap();
        assert_eq!(column.null_count(), 0);
        assert_eq!(column.str().unwrap().get(2), Some("Dang"));
    }

    #[test]
    fn test_apply_mode_ties_take_first_seen() {
        let mut df = df![
            "values" => [Some(5i64), Some(7), None, Some(7), Some(5)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        StatisticalImputer::apply_mode_imputation(&mut df, "values", &mut steps).unwrap();

        let column = df.column("values").unwrap();
        assert_eq!(column.dtype(), &DataType::Int64);
        assert_eq!(column.get(2).unwrap().try_extract::<i64>().unwrap(), 5);
    }

    #[test]
    fn test_apply_mode_all_missing_left_alone() {
        let mut df = df![
            "values" => [Option::<f64>::None, None],
        ]
        .unwrap();
        let mut steps = Vec::new();

        StatisticalImputer::apply_mode_imputation(&mut df, "values", &mut steps).unwrap();
        assert_eq!(df.column("values").unwrap().null_count(), 2);
        assert_eq!(steps.len(), 1);
        assert!(steps[0].starts_with("Left 'values' unchanged"));
    }

    #[test]
    fn test_mode_position() {
        let series = Series::new("s".into(), &["a", "b", "b", "a", "c"]);
        let mask = vec![false; 5];
        assert_eq!(mode_position(&series, &mask).unwrap(), Some(0));
    }
}
