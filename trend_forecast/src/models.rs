//! Forecasting models for time series data

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt::Debug;

/// Point forecast with optimistic/pessimistic bands.
///
/// All four sequences have the horizon's length, and at every step
/// `pessimistic <= point_forecast <= optimistic`. Deserialising checks the
/// same invariants as [`ForecastResult::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ForecastResultFields")]
pub struct ForecastResult {
    pub(crate) future_timestamps: Vec<NaiveDate>,
    pub(crate) point_forecast: Vec<f64>,
    pub(crate) optimistic: Vec<f64>,
    pub(crate) pessimistic: Vec<f64>,
    /// Label of the fitted model, e.g. `SARIMA(1,1,1)x(1,1,1,12)`
    pub(crate) model: String,
    /// Volatility the bands were scaled from
    pub(crate) sigma: f64,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(
        future_timestamps: Vec<NaiveDate>,
        point_forecast: Vec<f64>,
        optimistic: Vec<f64>,
        pessimistic: Vec<f64>,
        model: impl Into<String>,
        sigma: f64,
    ) -> Result<Self> {
        let horizon = point_forecast.len();
        if future_timestamps.len() != horizon || optimistic.len() != horizon || pessimistic.len() != horizon {
            return Err(ForecastError::ForecastFit(format!(
                "forecast sequences differ in length (timestamps {}, point {}, optimistic {}, pessimistic {})",
                future_timestamps.len(),
                horizon,
                optimistic.len(),
                pessimistic.len()
            )));
        }

        for i in 0..horizon {
            if !(pessimistic[i] <= point_forecast[i] && point_forecast[i] <= optimistic[i]) {
                return Err(ForecastError::ForecastFit(format!(
                    "band ordering violated at step {}: {} <= {} <= {}",
                    i + 1,
                    pessimistic[i],
                    point_forecast[i],
                    optimistic[i]
                )));
            }
        }

        Ok(Self {
            future_timestamps,
            point_forecast,
            optimistic,
            pessimistic,
            model: model.into(),
            sigma,
        })
    }

    pub fn future_timestamps(&self) -> &[NaiveDate] {
        &self.future_timestamps
    }

    pub fn point_forecast(&self) -> &[f64] {
        &self.point_forecast
    }

    pub fn optimistic(&self) -> &[f64] {
        &self.optimistic
    }

    pub fn pessimistic(&self) -> &[f64] {
        &self.pessimistic
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Number of periods forecasted
    pub fn horizon(&self) -> usize {
        self.point_forecast.len()
    }

    /// Distance between the optimistic and pessimistic bound at step `i` (0-based)
    pub fn band_width(&self, i: usize) -> Option<f64> {
        Some(self.optimistic.get(i)? - self.pessimistic.get(i)?)
    }
}

/// Unchecked serialised form of [`ForecastResult`]
#[derive(Deserialize)]
struct ForecastResultFields {
    future_timestamps: Vec<NaiveDate>,
    point_forecast: Vec<f64>,
    optimistic: Vec<f64>,
    pessimistic: Vec<f64>,
    model: String,
    sigma: f64,
}

impl TryFrom<ForecastResultFields> for ForecastResult {
    type Error = ForecastError;

    fn try_from(fields: ForecastResultFields) -> Result<Self> {
        ForecastResult::new(
            fields.future_timestamps,
            fields.point_forecast,
            fields.optimistic,
            fields.pessimistic,
            fields.model,
            fields.sigma,
        )
    }
}

/// Model fitted to a history, ready to extrapolate
pub trait FittedModel: Debug {
    /// Forecast `horizon` steps past the end of the history.
    ///
    /// `future_exog` must hold one regressor row per step when the model was
    /// fit with exogenous regressors, and be `None` otherwise.
    fn forecast(&self, horizon: usize, future_exog: Option<&[Vec<f64>]>) -> Result<Vec<f64>>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be fitted to a numeric history
pub trait ForecastModel: Debug + Clone {
    /// The type of fitted model produced
    type Fitted: FittedModel;

    /// Fit the model to `values`, optionally with one regressor row per value
    fn fit(&self, values: &[f64], exog: Option<&[Vec<f64>]>) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Whether a series carries no variation to model
pub(crate) fn is_degenerate(values: &[f64]) -> bool {
    if values.len() < 2 {
        return true;
    }
    let variance = values.iter().variance();
    let scale = values.iter().mean().abs().max(1.0);
    !variance.is_finite() || variance <= f64::EPSILON * scale * scale
}

pub mod exponential_smoothing;
pub mod sarima;
