//! Dense least squares for small regressor matrices, by Householder QR

use crate::{MathError, Result};

/// Default smallest `|R_kk| / max |R_jj|` accepted by [`least_squares`]
pub const RELATIVE_TOLERANCE: f64 = 1e-8;

/// Solve `min ||X b - y||` for `b`, where `rows` holds `X` row by row.
pub fn least_squares(rows: &[Vec<f64>], y: &[f64]) -> Result<Vec<f64>> {
    least_squares_with_tolerance(rows, y, RELATIVE_TOLERANCE)
}

/// [`least_squares`] that rejects the design when the smallest diagonal
/// entry of its `R` factor falls below `tolerance` times the largest.
///
/// Nearly collinear columns otherwise produce huge coefficients that
/// cancel in-sample and diverge out of sample.
pub fn least_squares_with_tolerance(rows: &[Vec<f64>], y: &[f64], tolerance: f64) -> Result<Vec<f64>> {
    if rows.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "Regressor rows ({}) don't match observations ({})",
            rows.len(),
            y.len()
        )));
    }
    let mut cols = columns(rows)?;
    let n = cols.len();
    let mut rhs = y.to_vec();
    triangularize(&mut cols, Some(&mut rhs));

    let ratio = diagonal_ratio(&cols);
    if !(ratio >= tolerance) {
        return Err(MathError::CalculationError(format!(
            "Regressor matrix is ill-conditioned (diagonal ratio {:.3e}, need {:.0e})",
            ratio, tolerance
        )));
    }

    // back substitution on the upper triangle
    let mut beta = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = rhs[i];
        for j in i + 1..n {
            sum -= cols[j][i] * beta[j];
        }
        beta[i] = sum / cols[i][i];
    }

    if beta.iter().any(|b| !b.is_finite()) {
        return Err(MathError::CalculationError(
            "Least-squares solution is not finite".to_string(),
        ));
    }

    Ok(beta)
}

/// `min |R_kk| / max |R_jj|` of the QR factorisation of `rows`: 1 for
/// orthogonal columns of equal norm, 0 for rank-deficient ones.
pub fn conditioning(rows: &[Vec<f64>]) -> Result<f64> {
    let mut cols = columns(rows)?;
    triangularize(&mut cols, None);
    Ok(diagonal_ratio(&cols))
}

/// Column-major copy of `rows`, checked for shape and finiteness
fn columns(rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let m = rows.len();
    let n = rows.first().map(Vec::len).unwrap_or(0);
    if n == 0 {
        return Err(MathError::InvalidInput(
            "Regressor matrix has no columns".to_string(),
        ));
    }
    if rows.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(
            "Regressor rows have inconsistent widths".to_string(),
        ));
    }
    if m < n {
        return Err(MathError::InsufficientData(format!(
            "Need at least {} observations for {} regressors, have {}",
            n, n, m
        )));
    }
    if rows.iter().flatten().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Regressor matrix is not finite".to_string(),
        ));
    }
    Ok((0..n).map(|j| rows.iter().map(|r| r[j]).collect()).collect())
}

/// Householder QR in place. `cols` ends up holding `R` in its upper
/// triangle and `rhs`, when given, holds `Q' y`.
fn triangularize(cols: &mut [Vec<f64>], mut rhs: Option<&mut Vec<f64>>) {
    let n = cols.len();
    for k in 0..n {
        let norm = cols[k][k..].iter().map(|v| v * v).sum::<f64>().sqrt();
        let alpha = if cols[k][k] > 0.0 { -norm } else { norm };
        let mut v = cols[k][k..].to_vec();
        v[0] -= alpha;
        let v_norm2: f64 = v.iter().map(|x| x * x).sum();

        if v_norm2 > 0.0 {
            for col in cols.iter_mut().skip(k + 1) {
                reflect(&v, v_norm2, &mut col[k..]);
            }
            if let Some(rhs) = rhs.as_deref_mut() {
                reflect(&v, v_norm2, &mut rhs[k..]);
            }
        }

        cols[k][k] = alpha;
        for value in cols[k][k + 1..].iter_mut() {
            *value = 0.0;
        }
    }
}

fn diagonal_ratio(cols: &[Vec<f64>]) -> f64 {
    let diagonal: Vec<f64> = cols.iter().enumerate().map(|(k, c)| c[k].abs()).collect();
    let largest = diagonal.iter().copied().fold(0.0_f64, f64::max);
    if largest == 0.0 {
        return 0.0;
    }
    diagonal.iter().copied().fold(f64::INFINITY, f64::min) / largest
}

/// Apply the Householder reflection `I - 2 v v' / (v' v)` to `target`
fn reflect(v: &[f64], v_norm2: f64, target: &mut [f64]) {
    let dot: f64 = v.iter().zip(target.iter()).map(|(a, b)| a * b).sum();
    let factor = 2.0 * dot / v_norm2;
    for (t, &vi) in target.iter_mut().zip(v.iter()) {
        *t -= factor * vi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_recovers_exact_coefficients() {
        let rows: Vec<Vec<f64>> = (0..10)
            .map(|i| {
                let x = i as f64;
                vec![1.0, x, (x * 0.3).sin()]
            })
            .collect();
        let y: Vec<f64> = rows.iter().map(|r| 2.0 * r[0] - 0.5 * r[1] + 4.0 * r[2]).collect();

        let beta = least_squares(&rows, &y).unwrap();
        assert_relative_eq!(beta[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(beta[1], -0.5, epsilon = 1e-9);
        assert_relative_eq!(beta[2], 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_collinear_columns() {
        let rows: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64, 2.0 * i as f64]).collect();
        let y = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        assert!(matches!(
            least_squares(&rows, &y),
            Err(MathError::CalculationError(_))
        ));
    }

    #[test]
    fn test_rejects_nearly_collinear_columns() {
        // third column differs from the second by a tiny wiggle
        let rows: Vec<Vec<f64>> = (0..20)
            .map(|i| {
                let x = i as f64;
                vec![1.0, x, x + 1e-9 * (x * 0.9).sin()]
            })
            .collect();
        let y: Vec<f64> = (0..20).map(|i| (i as f64 * 0.4).cos()).collect();

        assert!(conditioning(&rows).unwrap() < RELATIVE_TOLERANCE);
        assert!(matches!(
            least_squares(&rows, &y),
            Err(MathError::CalculationError(_))
        ));
    }

    #[test]
    fn test_tolerance_is_relative_to_largest_column() {
        // well conditioned, but the second column is a thousand times smaller
        let rows: Vec<Vec<f64>> = (0..8)
            .map(|i| vec![1000.0, if i % 2 == 0 { 1.0 } else { -1.0 }])
            .collect();
        let y: Vec<f64> = rows.iter().map(|r| 0.002 * r[0] + 3.0 * r[1]).collect();

        let ratio = conditioning(&rows).unwrap();
        assert_relative_eq!(ratio, 1e-3, max_relative = 1e-9);

        let beta = least_squares_with_tolerance(&rows, &y, 1e-4).unwrap();
        assert_relative_eq!(beta[1], 3.0, epsilon = 1e-9);
        assert!(matches!(
            least_squares_with_tolerance(&rows, &y, 1e-2),
            Err(MathError::CalculationError(_))
        ));
    }

    #[test]
    fn test_rejects_underdetermined_system() {
        let rows = vec![vec![1.0, 2.0, 3.0]];
        assert!(matches!(
            least_squares(&rows, &[1.0]),
            Err(MathError::InsufficientData(_))
        ));
    }
}
