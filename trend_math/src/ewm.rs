//! Exponentially weighted moments
//!
//! Recursive (non-adjusted) weighting with `alpha = 2 / (span + 1)`. The
//! standard deviation is bias corrected with the effective number of
//! observations, so it is undefined until two observations have been seen.

use crate::{MathError, Result};

/// Smoothing factor for a given span
pub fn alpha_from_span(span: usize) -> Result<f64> {
    if span == 0 {
        return Err(MathError::InvalidInput(
            "Span must be greater than zero".to_string(),
        ));
    }
    Ok(2.0 / (span as f64 + 1.0))
}

/// Bias-corrected exponentially weighted standard deviation at every position.
///
/// The first entry is always `None`; later entries are `None` only when the
/// effective sample size does not allow a bias correction.
pub fn ewm_std(values: &[f64], span: usize) -> Result<Vec<Option<f64>>> {
    let alpha = alpha_from_span(span)?;
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Input contains NaN or infinite values".to_string(),
        ));
    }

    let old_wt_factor = 1.0 - alpha;
    let new_wt = alpha;
    let mut out = Vec::with_capacity(values.len());

    let Some(&first) = values.first() else {
        return Ok(out);
    };

    let mut mean = first;
    let mut cov = 0.0;
    let mut sum_wt = 1.0;
    let mut sum_wt2 = 1.0;
    let mut old_wt = 1.0;
    out.push(None);

    for &value in &values[1..] {
        sum_wt *= old_wt_factor;
        sum_wt2 *= old_wt_factor * old_wt_factor;
        old_wt *= old_wt_factor;

        let old_mean = mean;
        // skip the update on equal values so constant input stays exactly constant
        if mean != value {
            mean = (old_wt * old_mean + new_wt * value) / (old_wt + new_wt);
        }
        cov = (old_wt * (cov + (old_mean - mean).powi(2)) + new_wt * (value - mean).powi(2))
            / (old_wt + new_wt);

        sum_wt += new_wt;
        sum_wt2 += new_wt * new_wt;
        old_wt += new_wt;
        sum_wt /= old_wt;
        sum_wt2 /= old_wt * old_wt;
        old_wt = 1.0;

        let numerator = sum_wt * sum_wt;
        let denominator = numerator - sum_wt2;
        if denominator > 0.0 {
            out.push(Some(((numerator / denominator) * cov).max(0.0).sqrt()));
        } else {
            out.push(None);
        }
    }

    Ok(out)
}

/// Bias-corrected exponentially weighted standard deviation at the last position
pub fn last_ewm_std(values: &[f64], span: usize) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Need at least 2 values for a weighted standard deviation, have {}",
            values.len()
        )));
    }

    ewm_std(values, span)?
        .last()
        .copied()
        .flatten()
        .ok_or_else(|| {
            MathError::CalculationError("Weighted standard deviation is undefined".to_string())
        })
}
