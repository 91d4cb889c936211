//! Ordinary least squares regression with an intercept.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Regressor, check_sample};
use crate::error::Result;

/// Pivots smaller than this fraction of the largest diagonal entry are
/// treated as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// Linear model `y = intercept + Σ coefficients[j] * x[j]`.
///
/// Fitted by solving the centred normal equations. Features that are constant
/// or a linear combination of earlier features get a zero coefficient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl Regressor for LinearRegression {
    fn fit(&mut self, rows: &[Vec<f64>], target: &[f64]) -> Result<()> {
        let width = check_sample(rows, target)?;
        let n = rows.len() as f64;

        let mut x_mean = vec![0.0; width];
        for row in rows {
            for (mean, value) in x_mean.iter_mut().zip(row) {
                *mean += value;
            }
        }
        x_mean.iter_mut().for_each(|mean| *mean /= n);
        let y_mean = target.iter().sum::<f64>() / n;

        // XᵀX and Xᵀy over centred values.
        let mut gram = vec![vec![0.0; width]; width];
        let mut rhs = vec![0.0; width];
        for (row, y) in rows.iter().zip(target) {
            let centred: Vec<f64> = row.iter().zip(&x_mean).map(|(v, m)| v - m).collect();
            let dy = y - y_mean;
            for j in 0..width {
                rhs[j] += centred[j] * dy;
                for k in j..width {
                    gram[j][k] += centred[j] * centred[k];
                }
            }
        }
        for j in 0..width {
            for k in 0..j {
                gram[j][k] = gram[k][j];
            }
        }

        let (coefficients, rank) = solve_normal_equations(gram, rhs);
        if rank < width {
            debug!(
                "Linear regression: {} of {} features are linearly dependent",
                width - rank,
                width
            );
        }

        self.intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(c, m)| c * m)
                .sum::<f64>();
        self.coefficients = coefficients;
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

/// Solve the symmetric system `a · x = b` by Gauss-Jordan elimination with
/// partial pivoting.
///
/// Columns without a usable pivot are free variables and are set to zero.
/// Returns the solution and the rank found.
fn solve_normal_equations(a: Vec<Vec<f64>>, b: Vec<f64>) -> (Vec<f64>, usize) {
    let n = b.len();
    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0, f64::max);
    let tolerance = (scale * RANK_TOLERANCE).max(f64::MIN_POSITIVE);

    // Augmented matrix [A|b].
    let mut augmented: Vec<Vec<f64>> = a
        .into_iter()
        .zip(b)
        .map(|(mut row, value)| {
            row.push(value);
            row
        })
        .collect();

    let mut pivot_columns = Vec::with_capacity(n);
    let mut rank = 0;
    for col in 0..n {
        let mut max_row = rank;
        let mut max_val = 0.0;
        for (r, row) in augmented.iter().enumerate().skip(rank) {
            if row[col].abs() > max_val {
                max_row = r;
                max_val = row[col].abs();
            }
        }
        if max_val <= tolerance {
            continue;
        }

        augmented.swap(rank, max_row);
        let pivot = augmented[rank][col];
        for value in augmented[rank].iter_mut() {
            *value /= pivot;
        }

        let pivot_row = augmented[rank].clone();
        for (r, row) in augmented.iter_mut().enumerate() {
            if r == rank {
                continue;
            }
            let factor = row[col];
            if factor != 0.0 {
                for (value, p) in row.iter_mut().zip(&pivot_row) {
                    *value -= factor * p;
                }
            }
        }

        pivot_columns.push(col);
        rank += 1;
    }

    let mut solution = vec![0.0; n];
    for (row, &col) in pivot_columns.iter().enumerate() {
        solution[col] = augmented[row][n];
    }
    (solution, rank)
}
