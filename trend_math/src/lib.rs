//! # Trend Math
//!
//! Numerical building blocks for trend and seasonal forecasting.
//! This crate has no notion of dates or granularities; it works on plain
//! `f64` slices and index positions.
//!
//! - [`regression`]: ordinary least-squares line fit
//! - [`fourier`]: sine/cosine regressors at one or more periods
//! - [`ewm`]: exponentially weighted mean and standard deviation
//! - [`linalg`]: dense least squares for small regressor matrices
//! - [`optimize`]: derivative-free Nelder-Mead minimiser

use thiserror::Error;

pub mod ewm;
pub mod fourier;
pub mod linalg;
pub mod optimize;
pub mod regression;

pub use fourier::{FourierTerm, PeriodicRegressors};
pub use regression::{LinearFit, LinearRegression};

/// Errors that can occur in numerical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("No convergence after {0} iterations")]
    NoConvergence(usize),
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, MathError>;
