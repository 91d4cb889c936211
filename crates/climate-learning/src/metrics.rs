//! Regression evaluation metrics.

use crate::error::{LearningError, Result};
use crate::types::Metrics;

fn check_lengths(y_true: &[f64], y_pred: &[f64]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(LearningError::InvalidData(format!(
            "length mismatch between actual and predicted values: {} vs {}",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(LearningError::InvalidData(
            "cannot evaluate an empty split".to_string(),
        ));
    }
    Ok(())
}

/// Mean absolute error.
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let total: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum();
    Ok(total / y_true.len() as f64)
}

/// Root mean squared error.
pub fn root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let total: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    Ok((total / y_true.len() as f64).sqrt())
}

/// Coefficient of determination.
///
/// A constant `y_true` scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Compute all regression metrics.
pub fn evaluate(y_true: &[f64], y_pred: &[f64]) -> Result<Metrics> {
    Ok(Metrics {
        r2: r2_score(y_true, y_pred)?,
        rmse: root_mean_squared_error(y_true, y_pred)?,
        mae: mean_absolute_error(y_true, y_pred)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_metrics_on_known_values() {
        let y_true = [3.0, -0.5, 2.0, 7.0];
        let y_pred = [2.5, 0.0, 2.0, 8.0];

        let metrics = evaluate(&y_true, &y_pred).unwrap();
        assert!((metrics.mae - 0.5).abs() < EPS);
        assert!((metrics.rmse - 0.375f64.sqrt()).abs() < EPS);
        assert!((metrics.r2 - 0.948_608_137_044_967_9).abs() < 1e-12);
    }

    #[test]
    fn test_r2_constant_target() {
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 2.0]).unwrap(), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[1.0, 3.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(evaluate(&[], &[]).is_err());
        assert!(evaluate(&[1.0, 2.0], &[1.0]).is_err());
    }
}
