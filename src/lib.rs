//! # Trendcast
//!
//! Trend lines, seasonal forecasts with volatility bands, and a
//! compute-once-per-day cache for the pipelines that feed them.
//!
//! The member crates can be used on their own:
//!
//! - [`trend_math`]: numerical building blocks
//! - [`trend_forecast`]: series, trend estimation, forecast engine, bands
//! - [`daily_cache`]: day-granular on-disk memoisation and retry policy
//!
//! [`CachedForecaster`] ties the engine to the cache so a forecast for the
//! same query is computed at most once per calendar day.
//!
//! ```
//! use chrono::NaiveDate;
//! use trendcast::{CachedForecaster, CacheKey, DailyCache, ForecastEngine, Granularity, HistoricalSeries};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let forecaster = CachedForecaster::new(ForecastEngine::new(), DailyCache::new(dir.path())?);
//!
//! let series = HistoricalSeries::from_pairs(
//!     (0..8).map(|y| (NaiveDate::from_ymd_opt(2015 + y, 1, 1).unwrap(), 50.0 + 3.0 * y as f64)),
//!     Granularity::Yearly,
//! )?;
//! let key = CacheKey::compose("MacroData", ["US", "population"])?;
//! let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
//!
//! let forecast = forecaster.forecast(&key, &series, Granularity::Yearly, day)?;
//! assert_eq!(forecast.horizon(), 5);
//! # Ok::<(), trendcast::TrendcastError>(())
//! ```

use chrono::NaiveDate;
use daily_cache::key::MAX_KEY_LEN;
use thiserror::Error;

pub use daily_cache;
pub use trend_forecast;
pub use trend_math;

pub use daily_cache::{CacheError, CacheKey, DailyCache, RetryPolicy};
pub use trend_forecast::{
    ForecastConfig, ForecastEngine, ForecastError, ForecastResult, Granularity, HistoricalSeries,
    Observation, SeriesLoader, TrendEstimator, TrendLine, VolatilityBandCalculator,
};

/// Longest key [`CachedForecaster::forecast`] accepts, leaving room for the
/// longest granularity suffix (`_quarterly`) within [`MAX_KEY_LEN`]
pub const MAX_FORECAST_KEY_LEN: usize = MAX_KEY_LEN - "_quarterly".len();

/// Errors from either the forecast engine or the cache
#[derive(Debug, Error)]
pub enum TrendcastError {
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Forecast engine memoised per query and calendar day
#[derive(Debug, Clone)]
pub struct CachedForecaster {
    engine: ForecastEngine,
    cache: DailyCache,
}

impl CachedForecaster {
    pub fn new(engine: ForecastEngine, cache: DailyCache) -> Self {
        Self { engine, cache }
    }

    pub fn engine(&self) -> &ForecastEngine {
        &self.engine
    }

    pub fn cache(&self) -> &DailyCache {
        &self.cache
    }

    /// Forecast `series`, reusing the result stored for `key` at
    /// `granularity` on `fetch_date` when there is one.
    ///
    /// The granularity is appended to `key`, so one logical series can be
    /// cached at several granularities on the same day. Keys longer than
    /// [`MAX_FORECAST_KEY_LEN`] are rejected with [`CacheError::InvalidKey`]
    /// whatever the granularity.
    pub fn forecast(
        &self,
        key: &CacheKey,
        series: &HistoricalSeries,
        granularity: Granularity,
        fetch_date: NaiveDate,
    ) -> Result<ForecastResult, TrendcastError> {
        if key.as_str().len() > MAX_FORECAST_KEY_LEN {
            return Err(CacheError::InvalidKey(format!(
                "key is {} bytes, forecasts allow {}",
                key.as_str().len(),
                MAX_FORECAST_KEY_LEN
            ))
            .into());
        }
        let key = key.join(granularity.as_str())?;
        self.cache
            .get_or_compute(&key, fetch_date, || Ok(self.engine.forecast(series, granularity)?))
    }
}
