//! Forecast engine configuration
//!
//! The default table:
//!
//! | granularity | history window | horizon | seasonal period | model |
//! |---|---|---|---|---|
//! | daily | 120 days | 30 | 7 | ARIMA(1,1,1) with Fourier terms at 7, 30, 365 (order 2) |
//! | weekly | 52 weeks | 12 | 52 | SARIMA(1,1,1)x(1,1,1,52) |
//! | monthly | 60 months | 12 | 12 | SARIMA(1,1,1)x(1,1,1,12) |
//! | quarterly | 5 years | 8 | 4 | SARIMA(1,1,1)x(1,1,1,4) |
//! | yearly | 20 years | 5 | none | Holt linear (additive trend) |

use crate::data::Granularity;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use trend_math::FourierTerm;

/// Length of a calendar window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodSpan {
    Days(u32),
    Weeks(u32),
    Months(u32),
    Years(u32),
}

/// Which model family a granularity is forecast with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStrategy {
    /// Non-seasonal ARIMA with periodic regressors standing in for seasonality
    FourierArima,
    /// Multiplicative seasonal ARIMA at the profile's seasonal period
    SeasonalArima,
    /// Additive-trend exponential smoothing, no seasonal term
    HoltLinear,
}

/// Forecast settings for one granularity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GranularityProfile {
    /// History shown alongside a forecast
    pub history_window: PeriodSpan,
    /// Number of future periods forecast
    pub horizon: usize,
    /// Steps per seasonal cycle
    pub seasonal_period: Option<usize>,
    pub strategy: ModelStrategy,
}

/// Limits for the parameter search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            max_iterations: 5_000,
            tolerance: 1e-10,
        }
    }
}

/// Complete engine configuration, injected at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub daily: GranularityProfile,
    pub weekly: GranularityProfile,
    pub monthly: GranularityProfile,
    pub quarterly: GranularityProfile,
    pub yearly: GranularityProfile,
    /// Periodic regressors used by [`ModelStrategy::FourierArima`]
    pub fourier_terms: Vec<FourierTerm>,
    /// Span of the exponentially weighted volatility estimate
    pub volatility_span: usize,
    #[serde(default)]
    pub optimizer: OptimizerSettings,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            daily: GranularityProfile {
                history_window: PeriodSpan::Days(120),
                horizon: 30,
                seasonal_period: Some(7),
                strategy: ModelStrategy::FourierArima,
            },
            weekly: GranularityProfile {
                history_window: PeriodSpan::Weeks(52),
                horizon: 12,
                seasonal_period: Some(52),
                strategy: ModelStrategy::SeasonalArima,
            },
            monthly: GranularityProfile {
                history_window: PeriodSpan::Months(60),
                horizon: 12,
                seasonal_period: Some(12),
                strategy: ModelStrategy::SeasonalArima,
            },
            quarterly: GranularityProfile {
                history_window: PeriodSpan::Years(5),
                horizon: 8,
                seasonal_period: Some(4),
                strategy: ModelStrategy::SeasonalArima,
            },
            yearly: GranularityProfile {
                history_window: PeriodSpan::Years(20),
                horizon: 5,
                seasonal_period: None,
                strategy: ModelStrategy::HoltLinear,
            },
            fourier_terms: vec![
                FourierTerm { period: 7.0, order: 2 },
                FourierTerm { period: 30.0, order: 2 },
                FourierTerm { period: 365.0, order: 2 },
            ],
            volatility_span: 12,
            optimizer: OptimizerSettings::default(),
        }
    }
}

impl ForecastConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn profile(&self, granularity: Granularity) -> &GranularityProfile {
        match granularity {
            Granularity::Daily => &self.daily,
            Granularity::Weekly => &self.weekly,
            Granularity::Monthly => &self.monthly,
            Granularity::Quarterly => &self.quarterly,
            Granularity::Yearly => &self.yearly,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for granularity in Granularity::ALL {
            let profile = self.profile(granularity);
            if profile.horizon == 0 {
                return Err(ForecastError::InvalidConfig(format!(
                    "{} horizon must be greater than zero",
                    granularity
                )));
            }
            match (profile.strategy, profile.seasonal_period) {
                (ModelStrategy::HoltLinear, _) => {}
                (_, Some(period)) if period >= 2 => {}
                (strategy, period) => {
                    return Err(ForecastError::InvalidConfig(format!(
                        "{} uses {:?} and needs a seasonal period of at least 2, got {:?}",
                        granularity, strategy, period
                    )))
                }
            }
        }

        if self.fourier_terms.is_empty() {
            return Err(ForecastError::InvalidConfig(
                "at least one Fourier term is required".to_string(),
            ));
        }
        for term in &self.fourier_terms {
            term.validate()
                .map_err(|e| ForecastError::InvalidConfig(e.to_string()))?;
        }
        if self.volatility_span == 0 {
            return Err(ForecastError::InvalidConfig(
                "volatility span must be greater than zero".to_string(),
            ));
        }
        if self.optimizer.max_iterations == 0 || !(self.optimizer.tolerance > 0.0) {
            return Err(ForecastError::InvalidConfig(
                "optimizer needs a positive iteration budget and tolerance".to_string(),
            ));
        }

        Ok(())
    }
}
