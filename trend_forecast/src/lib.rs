//! # Trend Forecast
//!
//! Trend lines, seasonal forecasts and volatility bands for financial and
//! macroeconomic time series.
//!
//! ## Features
//!
//! - Typed series with calendar granularities (daily to yearly)
//! - Series loading from normalised JSON records or CSV files
//! - Linear trend estimation over a trailing window
//! - Seasonal forecasting: ARIMA with Fourier regressors (daily), seasonal
//!   ARIMA (weekly, monthly, quarterly), Holt's linear method (yearly)
//! - Volatility bands widening with the square root of the horizon
//!
//! ## Granularity table
//!
//! | granularity | horizon | seasonal period | model |
//! |---|---|---|---|
//! | daily | 30 | 7 | ARIMA(1,1,1) + Fourier terms at 7, 30, 365 |
//! | weekly | 12 | 52 | SARIMA(1,1,1)x(1,1,1,52) |
//! | monthly | 12 | 12 | SARIMA(1,1,1)x(1,1,1,12) |
//! | quarterly | 8 | 4 | SARIMA(1,1,1)x(1,1,1,4) |
//! | yearly | 5 | - | Holt(additive) |
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use trend_forecast::{ForecastEngine, Granularity, HistoricalSeries, TrendEstimator};
//!
//! let series = HistoricalSeries::from_pairs(
//!     (0..60).map(|m| {
//!         let date = NaiveDate::from_ymd_opt(2015 + m / 12, (m % 12) as u32 + 1, 1).unwrap();
//!         (date, 100.0 + 2.0 * m as f64)
//!     }),
//!     Granularity::Monthly,
//! )?;
//!
//! let trend = TrendEstimator::new().estimate(&series, 24)?;
//! assert_eq!(trend.len(), 24);
//!
//! let forecast = ForecastEngine::new().forecast(&series, Granularity::Monthly)?;
//! assert_eq!(forecast.horizon(), 12);
//! # Ok::<(), trend_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod models;
pub mod trend;
pub mod utils;
pub mod volatility;

// Re-export commonly used types
pub use crate::config::{ForecastConfig, GranularityProfile, ModelStrategy, PeriodSpan};
pub use crate::data::{Granularity, HistoricalSeries, Observation, SeriesLoader};
pub use crate::engine::ForecastEngine;
pub use crate::error::{ForecastError, Result};
pub use crate::models::{FittedModel, ForecastModel, ForecastResult};
pub use crate::trend::{AnnotatedObservation, TrendEstimator, TrendLine, TrendPoint};
pub use crate::volatility::{VolatilityBandCalculator, VolatilityBands};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
