//! Periodic (Fourier) regressors
//!
//! For a period `P` and harmonic order `k` the regressors at integer index
//! `t` are `sin(2*pi*i*t/P)` and `cos(2*pi*i*t/P)` for `i = 1..=k`, in that
//! interleaved order. Values depend only on `t`, so evaluating `[0, n)` and
//! then `[n, n + h)` yields the same numbers as evaluating `[0, n + h)` once.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// One seasonal cycle approximated by `order` sine/cosine pairs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FourierTerm {
    /// Cycle length in index steps
    pub period: f64,
    /// Number of harmonics
    pub order: usize,
}

impl FourierTerm {
    pub fn new(period: f64, order: usize) -> Result<Self> {
        let term = Self { period, order };
        term.validate()?;
        Ok(term)
    }

    /// Number of columns this term contributes (`2 * order`)
    pub fn width(&self) -> usize {
        2 * self.order
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.period.is_finite() && self.period > 0.0) {
            return Err(MathError::InvalidInput(format!(
                "Fourier period must be positive, got {}",
                self.period
            )));
        }
        if self.order == 0 {
            return Err(MathError::InvalidInput(
                "Fourier order must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Regressor values at index `t`, appended to `row`
    fn extend_row(&self, t: usize, row: &mut Vec<f64>) {
        for i in 1..=self.order {
            let angle = 2.0 * PI * i as f64 * t as f64 / self.period;
            row.push(angle.sin());
            row.push(angle.cos());
        }
    }
}

/// Builds the regressor matrix for a set of overlapping seasonal cycles
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicRegressors {
    terms: Vec<FourierTerm>,
}

impl PeriodicRegressors {
    pub fn new(terms: Vec<FourierTerm>) -> Result<Self> {
        if terms.is_empty() {
            return Err(MathError::InvalidInput(
                "At least one Fourier term is required".to_string(),
            ));
        }
        for term in &terms {
            term.validate()?;
        }
        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[FourierTerm] {
        &self.terms
    }

    /// Total number of regressor columns
    pub fn width(&self) -> usize {
        self.terms.iter().map(FourierTerm::width).sum()
    }

    /// Rows for indices `start..start + len`, one row per index
    pub fn rows(&self, start: usize, len: usize) -> Vec<Vec<f64>> {
        (start..start + len)
            .map(|t| {
                let mut row = Vec::with_capacity(self.width());
                for term in &self.terms {
                    term.extend_row(t, &mut row);
                }
                row
            })
            .collect()
    }
}

/// Regressor rows for a single cycle over indices `start..start + len`
pub fn fourier_terms(start: usize, len: usize, period: f64, order: usize) -> Result<Vec<Vec<f64>>> {
    let term = FourierTerm::new(period, order)?;
    Ok(PeriodicRegressors { terms: vec![term] }.rows(start, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_row_is_zero_phase() {
        let rows = fourier_terms(0, 1, 7.0, 2).unwrap();
        assert_eq!(rows[0].len(), 4);
        assert!(rows[0][0].abs() < 1e-12);
        assert!((rows[0][1] - 1.0).abs() < 1e-12);
        assert!(rows[0][2].abs() < 1e-12);
        assert!((rows[0][3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rows_concatenate_terms_in_order() {
        let regressors = PeriodicRegressors::new(vec![
            FourierTerm::new(7.0, 1).unwrap(),
            FourierTerm::new(30.0, 2).unwrap(),
        ])
        .unwrap();

        assert_eq!(regressors.width(), 6);
        let row = &regressors.rows(5, 1)[0];
        let weekly = fourier_terms(5, 1, 7.0, 1).unwrap();
        let monthly = fourier_terms(5, 1, 30.0, 2).unwrap();
        assert_eq!(row[..2], weekly[0][..]);
        assert_eq!(row[2..], monthly[0][..]);
    }

    #[test]
    fn test_invalid_terms() {
        assert!(FourierTerm::new(0.0, 2).is_err());
        assert!(FourierTerm::new(7.0, 0).is_err());
        assert!(PeriodicRegressors::new(Vec::new()).is_err());
    }
}
