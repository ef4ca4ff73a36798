//! Calendar helpers: canonical period boundaries, alignment and future timestamps

use crate::config::PeriodSpan;
use crate::data::{Granularity, HistoricalSeries, Observation};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, Days, Months, NaiveDate};

/// Canonical timestamp of the period containing `date`.
///
/// Days map to themselves, weeks to the Sunday that ends them, months,
/// quarters and years to their first day.
pub fn canonical_timestamp(date: NaiveDate, granularity: Granularity) -> Result<NaiveDate> {
    let aligned = match granularity {
        Granularity::Daily => Some(date),
        Granularity::Weekly => {
            let to_sunday = 6 - u64::from(date.weekday().num_days_from_monday());
            date.checked_add_days(Days::new(to_sunday))
        }
        Granularity::Monthly => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
        Granularity::Quarterly => {
            let first_month = (date.month0() / 3) * 3 + 1;
            NaiveDate::from_ymd_opt(date.year(), first_month, 1)
        }
        Granularity::Yearly => NaiveDate::from_ymd_opt(date.year(), 1, 1),
    };

    aligned.ok_or_else(|| {
        ForecastError::InvalidSeries(format!("{} cannot be aligned to {} periods", date, granularity))
    })
}

/// Move a canonical timestamp forward by `steps` periods
pub fn advance(date: NaiveDate, granularity: Granularity, steps: u32) -> Result<NaiveDate> {
    let moved = match granularity {
        Granularity::Daily => date.checked_add_days(Days::new(u64::from(steps))),
        Granularity::Weekly => date.checked_add_days(Days::new(7 * u64::from(steps))),
        Granularity::Monthly => date.checked_add_months(Months::new(steps)),
        Granularity::Quarterly => date.checked_add_months(Months::new(3 * steps)),
        Granularity::Yearly => date.checked_add_months(Months::new(12 * steps)),
    };

    moved.ok_or_else(|| {
        ForecastError::InvalidSeries(format!(
            "{} + {} {} periods is out of the calendar range",
            date, steps, granularity
        ))
    })
}

/// Timestamps of the `horizon` periods following `last`
pub fn future_timestamps(last: NaiveDate, horizon: usize, granularity: Granularity) -> Result<Vec<NaiveDate>> {
    let horizon = u32::try_from(horizon)
        .map_err(|_| ForecastError::InvalidConfig(format!("horizon {} is too large", horizon)))?;
    (1..=horizon).map(|step| advance(last, granularity, step)).collect()
}

/// Earliest timestamp inside a window of length `span` ending at `last`
pub fn window_start(last: NaiveDate, span: PeriodSpan) -> Result<NaiveDate> {
    let start = match span {
        PeriodSpan::Days(n) => last.checked_sub_days(Days::new(u64::from(n))),
        PeriodSpan::Weeks(n) => last.checked_sub_days(Days::new(7 * u64::from(n))),
        PeriodSpan::Months(n) => last.checked_sub_months(Months::new(n)),
        PeriodSpan::Years(n) => last.checked_sub_months(Months::new(12 * n)),
    };

    start.ok_or_else(|| {
        ForecastError::InvalidSeries(format!("window {:?} before {} is out of range", span, last))
    })
}

/// Re-key a series onto the canonical boundaries of `granularity`.
///
/// Periods without an observation are simply absent. When several
/// observations fall into one period, the latest one represents it.
pub fn align(series: &HistoricalSeries, granularity: Granularity) -> Result<Vec<Observation>> {
    let mut aligned: Vec<Observation> = Vec::with_capacity(series.len());

    for obs in series.observations() {
        let timestamp = canonical_timestamp(obs.timestamp, granularity)?;
        match aligned.last_mut() {
            Some(prev) if prev.timestamp == timestamp => prev.value = obs.value,
            _ => aligned.push(Observation::new(timestamp, obs.value)),
        }
    }

    Ok(aligned)
}

/// Differences between consecutive values
pub fn first_differences(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}
