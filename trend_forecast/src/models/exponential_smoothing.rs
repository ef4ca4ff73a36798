//! Exponential smoothing models for time series forecasting

use crate::error::{ForecastError, Result};
use crate::models::{is_degenerate, FittedModel, ForecastModel};
use trend_math::optimize::NelderMead;

/// Fewest observations Holt's method is fit on
pub const MIN_OBSERVATIONS: usize = 4;

/// Holt's linear method: additive trend, no seasonality.
///
/// The level starts at the first observation and the trend at the first
/// difference. Both smoothing weights are chosen in (0, 1) by minimising the
/// one-step-ahead squared error.
#[derive(Debug, Clone)]
pub struct HoltLinear {
    name: String,
    optimizer: NelderMead,
}

/// Fitted Holt model
#[derive(Debug, Clone)]
pub struct FittedHolt {
    name: String,
    /// Level smoothing weight
    alpha: f64,
    /// Trend smoothing weight
    beta: f64,
    /// Level after the last observation
    level: f64,
    /// Trend after the last observation
    trend: f64,
    /// Sum of squared one-step errors
    sse: f64,
}

impl Default for HoltLinear {
    fn default() -> Self {
        Self::new()
    }
}

impl HoltLinear {
    pub fn new() -> Self {
        Self {
            name: "Holt(additive)".to_string(),
            optimizer: NelderMead::default(),
        }
    }

    pub fn with_optimizer(mut self, optimizer: NelderMead) -> Self {
        self.optimizer = optimizer;
        self
    }
}

/// Run the recursion, returning `(level, trend, sse)`
fn smooth(values: &[f64], alpha: f64, beta: f64) -> (f64, f64, f64) {
    let mut level = values[0];
    let mut trend = values[1] - values[0];
    let mut sse = 0.0;

    for &y in &values[1..] {
        let predicted = level + trend;
        sse += (y - predicted).powi(2);

        let previous = level;
        level = alpha * y + (1.0 - alpha) * predicted;
        trend = beta * (level - previous) + (1.0 - beta) * trend;
    }

    (level, trend, sse)
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl ForecastModel for HoltLinear {
    type Fitted = FittedHolt;

    fn fit(&self, values: &[f64], exog: Option<&[Vec<f64>]>) -> Result<FittedHolt> {
        if exog.is_some_and(|rows| rows.iter().any(|r| !r.is_empty())) {
            return Err(ForecastError::InvalidConfig(format!(
                "{} does not take regressors",
                self.name
            )));
        }
        if values.len() < MIN_OBSERVATIONS {
            return Err(ForecastError::ForecastFit(format!(
                "{} needs at least {} observations, have {}",
                self.name,
                MIN_OBSERVATIONS,
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidSeries(
                "series contains non-finite values".to_string(),
            ));
        }
        if is_degenerate(values) {
            return Err(ForecastError::ForecastFit(format!(
                "{}: series is constant, nothing to fit",
                self.name
            )));
        }

        let minimum = self.optimizer.minimize(
            |raw| smooth(values, logistic(raw[0]), logistic(raw[1])).2,
            &[0.0, 0.0],
        )?;
        let alpha = logistic(minimum.point[0]);
        let beta = logistic(minimum.point[1]);
        let (level, trend, sse) = smooth(values, alpha, beta);

        tracing::debug!(
            observations = values.len(),
            alpha,
            beta,
            sse,
            iterations = minimum.iterations,
            "fitted Holt linear model"
        );

        Ok(FittedHolt {
            name: self.name.clone(),
            alpha,
            beta,
            level,
            trend,
            sse,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedHolt {
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }

    pub fn sse(&self) -> f64 {
        self.sse
    }
}

impl FittedModel for FittedHolt {
    /// `level + h * trend` for `h = 1..=horizon`
    fn forecast(&self, horizon: usize, _future_exog: Option<&[Vec<f64>]>) -> Result<Vec<f64>> {
        Ok((1..=horizon)
            .map(|h| self.level + h as f64 * self.trend)
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_straight_line_is_extended() {
        let values: Vec<f64> = (0..10).map(|t| 3.0 + 1.5 * t as f64).collect();
        let fitted = HoltLinear::new().fit(&values, None).unwrap();
        let forecast = fitted.forecast(3, None).unwrap();

        assert_abs_diff_eq!(fitted.sse(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(forecast[0], 18.0, epsilon = 1e-9);
        assert_abs_diff_eq!(forecast[2], 21.0, epsilon = 1e-9);
    }

    #[test]
    fn test_weights_stay_in_unit_interval() {
        let values = [10.0, 12.0, 11.5, 14.0, 15.5, 15.0, 18.0, 19.5];
        let fitted = HoltLinear::new().fit(&values, None).unwrap();
        assert!((0.0..=1.0).contains(&fitted.alpha()));
        assert!((0.0..=1.0).contains(&fitted.beta()));
        assert!(fitted.trend() > 0.0);
    }

    #[test]
    fn test_too_few_points() {
        assert!(matches!(
            HoltLinear::new().fit(&[1.0, 2.0, 3.0], None),
            Err(ForecastError::ForecastFit(_))
        ));
    }
}
