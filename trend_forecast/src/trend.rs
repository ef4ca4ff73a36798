//! Linear trend lines over calendar offsets

use crate::data::{Granularity, HistoricalSeries, Observation};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use trend_math::{LinearFit, LinearRegression, MathError};

/// Trend value at one timestamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: NaiveDate,
    pub trend_value: f64,
}

/// Fitted trend aligned 1:1 with the observations it was fit against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    points: Vec<TrendPoint>,
    fit: LinearFit,
}

impl TrendLine {
    /// Trend points in ascending chronological order
    pub fn points(&self) -> &[TrendPoint] {
        &self.points
    }

    /// Change per day, or per year for yearly series
    pub fn slope(&self) -> f64 {
        self.fit.slope
    }

    /// Trend value at the earliest point of the window
    pub fn intercept(&self) -> f64 {
        self.fit.intercept
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Trend value at `timestamp`, if it was part of the fit
    pub fn value_at(&self, timestamp: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&timestamp, |p| p.timestamp)
            .ok()
            .map(|idx| self.points[idx].trend_value)
    }
}

/// An observation with its trend value, if any
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedObservation {
    pub timestamp: NaiveDate,
    pub value: f64,
    pub trend: Option<f64>,
}

/// Fits `trend = slope * offset + intercept` by ordinary least squares.
///
/// Offsets are whole days since the earliest point in the window, or whole
/// years for yearly series.
#[derive(Debug, Clone, Default)]
pub struct TrendEstimator;

impl TrendEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Fit a trend over the latest `window_length` observations (0 = all).
    ///
    /// A window longer than the series is clamped to the series length.
    pub fn estimate(&self, series: &HistoricalSeries, window_length: usize) -> Result<TrendLine> {
        let window = Self::window(series, window_length);
        if window.len() < 2 {
            return Err(ForecastError::InsufficientData(format!(
                "trend needs at least 2 observations, have {}",
                window.len()
            )));
        }

        let start = window[0].timestamp;
        let offsets: Vec<f64> = window
            .iter()
            .map(|o| offset(start, o.timestamp, series.granularity()))
            .collect();
        let values: Vec<f64> = window.iter().map(|o| o.value).collect();

        let fit = LinearRegression::fit(&offsets, &values).map_err(|err| match err {
            MathError::CalculationError(_) => ForecastError::InsufficientData(
                "observations in the window share a single offset".to_string(),
            ),
            other => other.into(),
        })?;

        tracing::trace!(
            points = window.len(),
            slope = fit.slope,
            intercept = fit.intercept,
            "fitted trend line"
        );

        let points = window
            .iter()
            .zip(offsets.iter())
            .map(|(o, &x)| TrendPoint {
                timestamp: o.timestamp,
                trend_value: fit.predict(x),
            })
            .collect();

        Ok(TrendLine { points, fit })
    }

    /// Left-join a freshly fitted trend onto every observation of `series`.
    ///
    /// Observations outside the window keep `trend: None`.
    pub fn annotate(&self, series: &HistoricalSeries, window_length: usize) -> Result<Vec<AnnotatedObservation>> {
        let line = self.estimate(series, window_length)?;
        Ok(series
            .observations()
            .iter()
            .map(|o| AnnotatedObservation {
                timestamp: o.timestamp,
                value: o.value,
                trend: line.value_at(o.timestamp),
            })
            .collect())
    }

    fn window(series: &HistoricalSeries, window_length: usize) -> &[Observation] {
        let all = series.observations();
        let take = if window_length == 0 {
            all.len()
        } else {
            window_length.min(all.len())
        };
        &all[all.len() - take..]
    }
}

fn offset(start: NaiveDate, timestamp: NaiveDate, granularity: Granularity) -> f64 {
    match granularity {
        Granularity::Yearly => f64::from(timestamp.year() - start.year()),
        _ => (timestamp - start).num_days() as f64,
    }
}
