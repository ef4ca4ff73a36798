//! Time series data handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

/// Sampling cadence of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Granularity {
    /// All recognised granularities, finest first
    pub const ALL: [Granularity; 5] = [
        Granularity::Daily,
        Granularity::Weekly,
        Granularity::Monthly,
        Granularity::Quarterly,
        Granularity::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
            Granularity::Quarterly => "quarterly",
            Granularity::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ForecastError;

    /// Case-insensitive parse of the five granularity tags
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            "quarterly" => Ok(Granularity::Quarterly),
            "yearly" => Ok(Granularity::Yearly),
            _ => Err(ForecastError::UnsupportedGranularity(format!(
                "'{}' is not one of daily, weekly, monthly, quarterly, yearly",
                s
            ))),
        }
    }
}

/// A single dated value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(timestamp: NaiveDate, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Ordered observations sampled at a known granularity.
///
/// Timestamps are strictly increasing and every value is finite. Gaps are
/// allowed and mean "missing"; nothing is ever filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalSeries {
    observations: Vec<Observation>,
    granularity: Granularity,
}

impl HistoricalSeries {
    /// Create a series from observations already in chronological order
    pub fn new(observations: Vec<Observation>, granularity: Granularity) -> Result<Self> {
        if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
            return Err(ForecastError::InvalidSeries(format!(
                "value at {} is not finite",
                bad.timestamp
            )));
        }
        for pair in observations.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(ForecastError::InvalidSeries(format!(
                    "timestamps must be strictly increasing ({} follows {})",
                    pair[1].timestamp, pair[0].timestamp
                )));
            }
        }

        Ok(Self {
            observations,
            granularity,
        })
    }

    /// Create a series from observations in any order; duplicates are rejected
    pub fn from_unsorted(mut observations: Vec<Observation>, granularity: Granularity) -> Result<Self> {
        observations.sort_by_key(|o| o.timestamp);
        if let Some(pair) = observations.windows(2).find(|p| p[0].timestamp == p[1].timestamp) {
            return Err(ForecastError::InvalidSeries(format!(
                "duplicate observation at {}",
                pair[0].timestamp
            )));
        }
        Self::new(observations, granularity)
    }

    /// Create a series from `(date, value)` pairs (for testing)
    pub fn from_pairs<I>(pairs: I, granularity: Granularity) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let observations = pairs
            .into_iter()
            .map(|(timestamp, value)| Observation::new(timestamp, value))
            .collect();
        Self::new(observations, granularity)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.timestamp).collect()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Loader for series normalised into `{date|year, value}` records
#[derive(Debug)]
pub struct SeriesLoader;

impl SeriesLoader {
    /// Parse `{"historical": [...]}` or a bare array of records.
    ///
    /// Each record needs a `date` (`YYYY-MM-DD`, optionally followed by a time)
    /// or a `year` (number or string, mapped to January 1st) and a `value`.
    /// Records whose value is `null` are skipped.
    pub fn from_json_str(json: &str, granularity: Granularity) -> Result<HistoricalSeries> {
        let root: Value = serde_json::from_str(json)?;
        let records = match &root {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("historical") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(ForecastError::InvalidSeries(
                        "expected a 'historical' array".to_string(),
                    ))
                }
            },
            _ => {
                return Err(ForecastError::InvalidSeries(
                    "expected an object or an array of records".to_string(),
                ))
            }
        };

        let mut observations = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let parsed = match (record.get("date"), record.get("year")) {
                (Some(date), _) => parse_date_value(date),
                (None, Some(year)) => parse_year_value(year),
                (None, None) => None,
            };
            let timestamp = parsed.ok_or_else(|| {
                ForecastError::InvalidSeries(format!("record {} has no usable date or year", i))
            })?;

            let parsed = match record.get("value") {
                None | Some(Value::Null) => continue,
                Some(Value::Number(n)) => n.as_f64(),
                Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
                Some(_) => None,
            };
            let value = parsed.ok_or_else(|| {
                ForecastError::InvalidSeries(format!("record {} has a non-numeric value", i))
            })?;

            observations.push(Observation::new(timestamp, value));
        }

        HistoricalSeries::from_unsorted(observations, granularity)
    }

    /// Load a CSV file with a `date` or `year` column and a `value` column.
    ///
    /// Rows with an empty value are skipped.
    pub fn from_csv<P: AsRef<Path>>(path: P, granularity: Granularity) -> Result<HistoricalSeries> {
        let file = File::open(path)?;
        let mut reader = csv::Reader::from_reader(file);
        let headers = reader.headers()?.clone();

        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        let value_idx = find("value").ok_or_else(|| {
            ForecastError::InvalidSeries("CSV has no 'value' column".to_string())
        })?;
        let (time_idx, yearly) = match (find("date"), find("year")) {
            (Some(idx), _) => (idx, false),
            (None, Some(idx)) => (idx, true),
            (None, None) => {
                return Err(ForecastError::InvalidSeries(
                    "CSV has no 'date' or 'year' column".to_string(),
                ))
            }
        };

        let mut observations = Vec::new();
        for (line, row) in reader.records().enumerate() {
            let row = row?;
            let raw_value = row.get(value_idx).unwrap_or("").trim();
            if raw_value.is_empty() {
                continue;
            }
            let value = raw_value.parse::<f64>().map_err(|_| {
                ForecastError::InvalidSeries(format!("row {}: '{}' is not a number", line + 1, raw_value))
            })?;

            let raw_time = row.get(time_idx).unwrap_or("").trim();
            let parsed = if yearly {
                raw_time.parse::<i32>().ok().and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
            } else {
                parse_date_str(raw_time)
            };
            let timestamp = parsed.ok_or_else(|| {
                ForecastError::InvalidSeries(format!("row {}: '{}' is not a date", line + 1, raw_time))
            })?;

            observations.push(Observation::new(timestamp, value));
        }

        HistoricalSeries::from_unsorted(observations, granularity)
    }
}

fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn parse_date_value(value: &Value) -> Option<NaiveDate> {
    value.as_str().and_then(parse_date_str)
}

fn parse_year_value(value: &Value) -> Option<NaiveDate> {
    let year = match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }?;
    NaiveDate::from_ymd_opt(year, 1, 1)
}
