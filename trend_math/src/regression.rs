//! Ordinary least-squares line fitting
//!
//! Fits `y = slope * x + intercept` over arbitrary `(x, y)` pairs. The x
//! values do not need to be evenly spaced, which is what allows callers to
//! regress on calendar offsets with gaps in them.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Slope and intercept of a fitted line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// Change in y per unit of x
    pub slope: f64,
    /// Value of the line at x = 0
    pub intercept: f64,
}

impl LinearFit {
    /// Evaluate the line at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Least-squares line estimator
#[derive(Debug, Clone, Default)]
pub struct LinearRegression;

impl LinearRegression {
    /// Fit a line through the given points.
    ///
    /// Requires at least two points and at least two distinct x values.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Result<LinearFit> {
        if xs.len() != ys.len() {
            return Err(MathError::InvalidInput(format!(
                "x length ({}) doesn't match y length ({})",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(MathError::InsufficientData(format!(
                "Need at least 2 points for linear regression, have {}",
                xs.len()
            )));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Regression input contains NaN or infinite values".to_string(),
            ));
        }

        let n = xs.len() as f64;
        let x_mean = xs.iter().sum::<f64>() / n;
        let y_mean = ys.iter().sum::<f64>() / n;

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (&x, &y) in xs.iter().zip(ys.iter()) {
            numerator += (x - x_mean) * (y - y_mean);
            denominator += (x - x_mean) * (x - x_mean);
        }

        if denominator.abs() < 1e-10 {
            return Err(MathError::CalculationError(
                "Cannot calculate slope: x values are too similar".to_string(),
            ));
        }

        let slope = numerator / denominator;
        let intercept = y_mean - slope * x_mean;

        Ok(LinearFit { slope, intercept })
    }
}
