//! Feature and target extraction from a processed DataFrame.

use polars::prelude::*;

use crate::error::{LearningError, Result};

/// Row-major feature matrix with its target vector.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingData {
    pub feature_names: Vec<String>,
    pub target_name: String,
    /// One entry per row, each holding one value per feature.
    pub rows: Vec<Vec<f64>>,
    pub target: Vec<f64>,
}

impl TrainingData {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy the rows at `indices` into feature rows and targets.
    pub fn subset(&self, indices: &[usize]) -> (Vec<Vec<f64>>, Vec<f64>) {
        let rows = indices.iter().map(|&i| self.rows[i].clone()).collect();
        let target = indices.iter().map(|&i| self.target[i]).collect();
        (rows, target)
    }
}

/// Read `features` and `target` from `df` as f64 values.
///
/// Every column must exist, hold numbers or booleans, and contain no nulls
/// or NaN.
pub fn extract(df: &DataFrame, features: &[String], target: &str) -> Result<TrainingData> {
    if features.is_empty() {
        return Err(LearningError::InvalidData(
            "at least one feature column is required".to_string(),
        ));
    }
    if features.iter().any(|f| f == target) {
        return Err(LearningError::InvalidData(format!(
            "target column '{}' cannot also be a feature",
            target
        )));
    }

    let target_column = df
        .column(target)
        .map_err(|_| LearningError::TargetNotFound(target.to_string()))?;
    let target_values = numeric_values(target_column.as_materialized_series())?;

    let mut columns = Vec::with_capacity(features.len());
    for name in features {
        let column = df
            .column(name)
            .map_err(|_| LearningError::FeatureNotFound(name.clone()))?;
        columns.push(numeric_values(column.as_materialized_series())?);
    }

    let rows = (0..df.height())
        .map(|row| columns.iter().map(|values| values[row]).collect())
        .collect();

    Ok(TrainingData {
        feature_names: features.to_vec(),
        target_name: target.to_string(),
        rows,
        target: target_values,
    })
}

fn numeric_values(series: &Series) -> Result<Vec<f64>> {
    let dtype = series.dtype();
    if !(dtype.is_primitive_numeric() || dtype == &DataType::Boolean) {
        return Err(LearningError::InvalidData(format!(
            "column '{}' has type {}; convert it to a number before training",
            series.name(),
            dtype
        )));
    }

    let floats = series.cast(&DataType::Float64)?;
    let mut values = Vec::with_capacity(series.len());
    for value in floats.f64()?.into_iter() {
        match value {
            Some(v) if !v.is_nan() => values.push(v),
            _ => {
                return Err(LearningError::InvalidData(format!(
                    "column '{}' contains missing values; resolve them during preprocessing",
                    series.name()
                )));
            }
        }
    }
    Ok(values)
}
