//! Volatility bands around a point forecast

use crate::error::{ForecastError, Result};
use crate::utils::first_differences;
use serde::{Deserialize, Serialize};
use trend_math::ewm::last_ewm_std;

/// Optimistic and pessimistic paths around a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityBands {
    pub optimistic: Vec<f64>,
    pub pessimistic: Vec<f64>,
    /// Exponentially weighted standard deviation of the history's changes
    pub sigma: f64,
}

/// Widens bands as `sigma * sqrt(step)`, step counted from 1.
///
/// `sigma` is the last value of the exponentially weighted standard
/// deviation (span-based, no adjustment, bias corrected) of the first
/// differences of the history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityBandCalculator {
    span: usize,
}

impl Default for VolatilityBandCalculator {
    fn default() -> Self {
        Self { span: 12 }
    }
}

impl VolatilityBandCalculator {
    pub fn new(span: usize) -> Result<Self> {
        if span == 0 {
            return Err(ForecastError::InvalidConfig(
                "volatility span must be greater than zero".to_string(),
            ));
        }
        Ok(Self { span })
    }

    pub fn span(&self) -> usize {
        self.span
    }

    /// Volatility estimate from a history's first differences
    pub fn sigma(&self, differences: &[f64]) -> Result<f64> {
        if differences.len() < 2 {
            return Err(ForecastError::InsufficientHistory(format!(
                "volatility needs at least 2 period-over-period changes, have {}",
                differences.len()
            )));
        }
        let sigma = last_ewm_std(differences, self.span)?;
        if !sigma.is_finite() {
            return Err(ForecastError::InsufficientHistory(
                "volatility estimate is not finite".to_string(),
            ));
        }
        Ok(sigma)
    }

    /// Bands around `point_forecast` from precomputed first differences
    pub fn calculate(&self, differences: &[f64], point_forecast: &[f64]) -> Result<VolatilityBands> {
        let sigma = self.sigma(differences)?;

        let (optimistic, pessimistic) = point_forecast
            .iter()
            .enumerate()
            .map(|(i, &point)| {
                let half_width = sigma * ((i + 1) as f64).sqrt();
                (point + half_width, point - half_width)
            })
            .unzip();

        tracing::trace!(sigma, horizon = point_forecast.len(), "computed volatility bands");

        Ok(VolatilityBands {
            optimistic,
            pessimistic,
            sigma,
        })
    }

    /// Bands around `point_forecast` from the raw history values
    pub fn from_history(&self, history: &[f64], point_forecast: &[f64]) -> Result<VolatilityBands> {
        self.calculate(&first_differences(history), point_forecast)
    }
}
