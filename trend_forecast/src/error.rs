//! Error types for the trend_forecast crate

use thiserror::Error;
use trend_math::MathError;

/// Custom error types for the trend_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Too few points for a trend or band computation
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Granularity tag outside daily/weekly/monthly/quarterly/yearly
    #[error("Unsupported granularity: {0}")]
    UnsupportedGranularity(String),

    /// Numerical fit failure or degenerate input
    #[error("Forecast fit failed: {0}")]
    ForecastFit(String),

    /// Too few first differences to estimate volatility
    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    /// Series violates its ordering or value invariants
    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    /// Engine configuration is not usable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON parsing
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InsufficientData(msg) => ForecastError::InsufficientData(msg),
            MathError::InvalidInput(msg) => ForecastError::InvalidSeries(msg),
            MathError::CalculationError(msg) => ForecastError::ForecastFit(msg),
            MathError::NoConvergence(iterations) => ForecastError::ForecastFit(format!(
                "optimiser did not converge within {} iterations",
                iterations
            )),
        }
    }
}
