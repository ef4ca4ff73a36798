//! Seasonal forecast engine
//!
//! Each call aligns the series onto the requested granularity, picks the
//! model family from the configuration table, fits it on the aligned values
//! (by position, not by calendar date) and wraps the point forecast in
//! volatility bands.

use crate::config::{ForecastConfig, ModelStrategy};
use crate::data::{Granularity, HistoricalSeries, Observation};
use crate::error::{ForecastError, Result};
use crate::models::exponential_smoothing::{HoltLinear, MIN_OBSERVATIONS as HOLT_MINIMUM_POINTS};
use crate::models::sarima::{SarimaModel, SarimaOrder};
use crate::models::{FittedModel, ForecastModel, ForecastResult};
use crate::utils::{align, future_timestamps, window_start};
use crate::volatility::VolatilityBandCalculator;
use trend_math::optimize::NelderMead;
use trend_math::PeriodicRegressors;

/// Forecasts a series at one of the five supported granularities.
///
/// The engine holds only its configuration; every call is a pure function
/// of the series passed in.
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    config: ForecastConfig,
}

impl ForecastEngine {
    /// Engine using the default granularity table
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine using a custom, validated configuration
    pub fn with_config(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Shortest aligned history [`forecast`](Self::forecast) accepts at
    /// `granularity`.
    ///
    /// Seasonal models need two full seasonal cycles and enough points left
    /// after differencing to estimate their coefficients. For periodic
    /// regressors this is the shortest history whose differenced regressor
    /// design is identifiable; with the default terms (7, 30, 365) that is
    /// 62 days. Holt needs 4 points.
    pub fn minimum_points(&self, granularity: Granularity) -> Result<usize> {
        let profile = self.config.profile(granularity);
        match profile.strategy {
            ModelStrategy::HoltLinear => Ok(HOLT_MINIMUM_POINTS),
            ModelStrategy::SeasonalArima => {
                let period = seasonal_period(profile.seasonal_period, granularity)?;
                let model = SarimaModel::new(SarimaOrder::airline(period))?;
                Ok((2 * period).max(model.required_observations()))
            }
            ModelStrategy::FourierArima => {
                let period = seasonal_period(profile.seasonal_period, granularity)?;
                let model = SarimaModel::new(SarimaOrder::non_seasonal(1, 1, 1))?;
                let regressors = PeriodicRegressors::new(self.config.fourier_terms.clone())?;
                let floor = (2 * period).max(model.required_observations());
                let longest = regressors
                    .terms()
                    .iter()
                    .map(|t| t.period.ceil() as usize)
                    .max()
                    .unwrap_or(0);
                let limit = floor.max(2 * longest).max(2 * regressors.width());
                let rows = regressors.rows(0, limit);
                (floor..=limit)
                    .find(|&n| model.regressors_identifiable(&rows[..n]))
                    .ok_or_else(|| {
                        ForecastError::InvalidConfig(format!(
                            "{} can never be identified within {} points",
                            describe_terms(&regressors),
                            limit
                        ))
                    })
            }
        }
    }

    /// Forecast `series` at `granularity`.
    ///
    /// Fails with [`ForecastError::ForecastFit`] when the aligned history is
    /// shorter than [`minimum_points`](Self::minimum_points), is constant,
    /// or the fit does not converge, and with
    /// [`ForecastError::InsufficientHistory`] when the volatility cannot be
    /// estimated.
    pub fn forecast(&self, series: &HistoricalSeries, granularity: Granularity) -> Result<ForecastResult> {
        let profile = self.config.profile(granularity);
        let aligned = align(series, granularity)?;
        let minimum = self.minimum_points(granularity)?;
        if aligned.len() < minimum {
            return Err(ForecastError::ForecastFit(format!(
                "{} forecast needs at least {} aligned points, have {}",
                granularity,
                minimum,
                aligned.len()
            )));
        }

        let last = aligned
            .last()
            .map(|o| o.timestamp)
            .ok_or_else(|| ForecastError::InsufficientData("series is empty".to_string()))?;
        let values: Vec<f64> = aligned.iter().map(|o| o.value).collect();
        let horizon = profile.horizon;
        let optimizer = NelderMead::new(self.config.optimizer.max_iterations, self.config.optimizer.tolerance)?;

        let (point_forecast, label) = match profile.strategy {
            ModelStrategy::FourierArima => {
                let regressors = PeriodicRegressors::new(self.config.fourier_terms.clone())?;
                let history = regressors.rows(0, values.len());
                let future = regressors.rows(values.len(), horizon);
                let model = SarimaModel::new(SarimaOrder::non_seasonal(1, 1, 1))?.with_optimizer(optimizer);
                let (forecast, name) = fit_and_forecast(
                    &model,
                    &values,
                    Some(history.as_slice()),
                    horizon,
                    Some(future.as_slice()),
                )?;
                (forecast, format!("{} with {}", name, describe_terms(&regressors)))
            }
            ModelStrategy::SeasonalArima => {
                let period = seasonal_period(profile.seasonal_period, granularity)?;
                let model = SarimaModel::new(SarimaOrder::airline(period))?.with_optimizer(optimizer);
                fit_and_forecast(&model, &values, None, horizon, None)?
            }
            ModelStrategy::HoltLinear => {
                let model = HoltLinear::new().with_optimizer(optimizer);
                fit_and_forecast(&model, &values, None, horizon, None)?
            }
        };

        let bands = VolatilityBandCalculator::new(self.config.volatility_span)?
            .from_history(&values, &point_forecast)?;
        let timestamps = future_timestamps(last, horizon, granularity)?;

        tracing::debug!(
            %granularity,
            model = %label,
            history = values.len(),
            horizon,
            sigma = bands.sigma,
            "produced forecast"
        );

        ForecastResult::new(
            timestamps,
            point_forecast,
            bands.optimistic,
            bands.pessimistic,
            label,
            bands.sigma,
        )
    }

    /// Forecast with a textual granularity tag such as `"monthly"`
    pub fn forecast_tagged(&self, series: &HistoricalSeries, tag: &str) -> Result<ForecastResult> {
        let granularity: Granularity = tag.parse()?;
        self.forecast(series, granularity)
    }

    /// Aligned observations inside the granularity's history window, ending
    /// at the last observation.
    pub fn recent_history(&self, series: &HistoricalSeries, granularity: Granularity) -> Result<Vec<Observation>> {
        let aligned = align(series, granularity)?;
        let Some(last) = aligned.last().map(|o| o.timestamp) else {
            return Ok(aligned);
        };
        let start = window_start(last, self.config.profile(granularity).history_window)?;
        Ok(aligned.into_iter().filter(|o| o.timestamp > start).collect())
    }
}

fn fit_and_forecast<M: ForecastModel>(
    model: &M,
    values: &[f64],
    exog: Option<&[Vec<f64>]>,
    horizon: usize,
    future_exog: Option<&[Vec<f64>]>,
) -> Result<(Vec<f64>, String)> {
    let fitted = model.fit(values, exog)?;
    let forecast = fitted.forecast(horizon, future_exog)?;
    Ok((forecast, fitted.name().to_string()))
}

fn seasonal_period(period: Option<usize>, granularity: Granularity) -> Result<usize> {
    period.ok_or_else(|| ForecastError::InvalidConfig(format!("{} has no seasonal period", granularity)))
}

fn describe_terms(regressors: &PeriodicRegressors) -> String {
    let terms: Vec<String> = regressors
        .terms()
        .iter()
        .map(|t| format!("{}x{}", t.period, t.order))
        .collect();
    format!("Fourier[{}]", terms.join(", "))
}
