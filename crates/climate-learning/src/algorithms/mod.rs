//! Regression algorithms.
//!
//! Each algorithm implements [`Regressor`]. A fitted model is stored as a
//! [`FittedModel`], the serializable form written into the model artifact.

pub mod linear;
pub mod tree;

pub use linear::LinearRegression;
pub use tree::{DecisionTree, TreeNode};

use serde::{Deserialize, Serialize};

use crate::config::{Algorithm, TrainingConfig};
use crate::error::Result;

/// A model that can be fitted on row-major features and predict one row.
pub trait Regressor {
    /// Fit on `rows` (one feature vector per row) and `target`.
    fn fit(&mut self, rows: &[Vec<f64>], target: &[f64]) -> Result<()>;

    /// Predict the target for one feature vector.
    fn predict_row(&self, row: &[f64]) -> f64;

    /// Predict every row.
    fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }
}

/// A fitted model of either kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedModel {
    LinearRegression(LinearRegression),
    DecisionTree(DecisionTree),
}

impl FittedModel {
    /// Fit the algorithm named by `config`.
    pub fn fit(config: &TrainingConfig, rows: &[Vec<f64>], target: &[f64]) -> Result<Self> {
        match config.algorithm {
            Algorithm::LinearRegression => {
                let mut model = LinearRegression::default();
                model.fit(rows, target)?;
                Ok(FittedModel::LinearRegression(model))
            }
            Algorithm::DecisionTree => {
                let mut model = DecisionTree::new(config.max_depth, config.min_samples_split);
                model.fit(rows, target)?;
                Ok(FittedModel::DecisionTree(model))
            }
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            FittedModel::LinearRegression(_) => Algorithm::LinearRegression,
            FittedModel::DecisionTree(_) => Algorithm::DecisionTree,
        }
    }

    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            FittedModel::LinearRegression(model) => model,
            FittedModel::DecisionTree(model) => model,
        }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.as_regressor().predict_row(row)
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        self.as_regressor().predict(rows)
    }
}

/// Check that `rows` and `target` describe a non-empty, rectangular sample.
pub(crate) fn check_sample(rows: &[Vec<f64>], target: &[f64]) -> Result<usize> {
    use crate::error::LearningError;

    if rows.is_empty() {
        return Err(LearningError::TrainingFailed(
            "no training rows".to_string(),
        ));
    }
    if rows.len() != target.len() {
        return Err(LearningError::TrainingFailed(format!(
            "{} feature rows but {} target values",
            rows.len(),
            target.len()
        )));
    }
    let width = rows[0].len();
    if rows.iter().any(|row| row.len() != width) {
        return Err(LearningError::TrainingFailed(
            "feature rows have different lengths".to_string(),
        ));
    }
    Ok(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fitted_model_dispatch() {
        let rows = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let target = vec![2.0, 4.0, 6.0, 8.0];

        for algorithm in Algorithm::ALL {
            let config = TrainingConfig::builder().algorithm(algorithm).build().unwrap();
            let model = FittedModel::fit(&config, &rows, &target).unwrap();
            assert_eq!(model.algorithm(), algorithm);
            let predictions = model.predict(&rows);
            for (p, t) in predictions.iter().zip(&target) {
                assert!((p - t).abs() < 1e-9, "{}: {} vs {}", algorithm, p, t);
            }
        }
    }

    #[test]
    fn test_fitted_model_serializes_with_kind_tag() {
        let mut model = LinearRegression::default();
        model.fit(&[vec![0.0], vec![1.0]], &[1.0, 3.0]).unwrap();
        let json = serde_json::to_value(FittedModel::LinearRegression(model)).unwrap();
        assert_eq!(json["kind"], "linear_regression");
    }

    #[test]
    fn test_check_sample() {
        assert!(check_sample(&[], &[]).is_err());
        assert!(check_sample(&[vec![1.0]], &[1.0, 2.0]).is_err());
        assert!(check_sample(&[vec![1.0], vec![1.0, 2.0]], &[1.0, 2.0]).is_err());
        assert_eq!(check_sample(&[vec![1.0, 2.0]], &[1.0]).unwrap(), 2);
    }
}
