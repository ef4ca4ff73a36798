//! Nelder-Mead simplex minimiser
//!
//! Small, derivative-free and deterministic: the same objective and
//! starting point always walk the same path, so fitted models are
//! reproducible bit for bit.

use crate::{MathError, Result};

/// Outcome of a successful minimisation
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations used
    pub iterations: usize,
}

/// Nelder-Mead with the standard reflection/expansion/contraction/shrink coefficients
#[derive(Debug, Clone, PartialEq)]
pub struct NelderMead {
    max_iterations: usize,
    tolerance: f64,
    x_tolerance: f64,
    initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 5_000,
            tolerance: 1e-10,
            x_tolerance: 1e-9,
            initial_step: 0.5,
        }
    }
}

impl NelderMead {
    pub fn new(max_iterations: usize, tolerance: f64) -> Result<Self> {
        if max_iterations == 0 {
            return Err(MathError::InvalidInput(
                "Iteration budget must be greater than zero".to_string(),
            ));
        }
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(MathError::InvalidInput(format!(
                "Tolerance must be positive, got {}",
                tolerance
            )));
        }
        Ok(Self {
            max_iterations,
            tolerance,
            ..Self::default()
        })
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Minimise `objective` starting from `start`.
    ///
    /// Stops once the objective values across the simplex agree to within
    /// the relative tolerance, or once every vertex is within `1e-9` of the
    /// best one. Non-finite objective values are treated as `+inf`, which
    /// steers the simplex away from them. Fails with
    /// [`MathError::NoConvergence`] when neither happens within the
    /// iteration budget.
    pub fn minimize<F>(&self, objective: F, start: &[f64]) -> Result<Minimum>
    where
        F: Fn(&[f64]) -> f64,
    {
        let dim = start.len();
        let eval = |x: &[f64]| {
            let value = objective(x);
            if value.is_finite() {
                value
            } else {
                f64::INFINITY
            }
        };

        if dim == 0 {
            return Ok(Minimum {
                point: Vec::new(),
                value: eval(start),
                iterations: 0,
            });
        }

        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(dim + 1);
        simplex.push((start.to_vec(), eval(start)));
        for i in 0..dim {
            let mut vertex = start.to_vec();
            vertex[i] += self.initial_step;
            let value = eval(&vertex);
            simplex.push((vertex, value));
        }

        for iteration in 0..self.max_iterations {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

            let best = simplex[0].1;
            let worst = simplex[dim].1;
            let diameter = simplex[1..]
                .iter()
                .flat_map(|(v, _)| v.iter().zip(simplex[0].0.iter()).map(|(a, b)| (a - b).abs()))
                .fold(0.0_f64, f64::max);
            if best.is_finite()
                && ((worst - best).abs() <= self.tolerance * (best.abs() + worst.abs()) + 1e-300
                    || diameter <= self.x_tolerance)
            {
                let (point, value) = simplex.swap_remove(0);
                return Ok(Minimum {
                    point,
                    value,
                    iterations: iteration,
                });
            }

            let centroid: Vec<f64> = (0..dim)
                .map(|j| simplex[..dim].iter().map(|(v, _)| v[j]).sum::<f64>() / dim as f64)
                .collect();
            let toward = |from: &[f64], coef: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(from.iter())
                    .map(|(c, x)| c + coef * (x - c))
                    .collect()
            };

            let worst_point = simplex[dim].0.clone();
            let reflected = toward(&worst_point, -1.0);
            let reflected_value = eval(&reflected);

            if reflected_value < simplex[0].1 {
                let expanded = toward(&worst_point, -2.0);
                let expanded_value = eval(&expanded);
                simplex[dim] = if expanded_value < reflected_value {
                    (expanded, expanded_value)
                } else {
                    (reflected, reflected_value)
                };
                continue;
            }

            if reflected_value < simplex[dim - 1].1 {
                simplex[dim] = (reflected, reflected_value);
                continue;
            }

            let contracted = if reflected_value < worst {
                toward(&reflected, 0.5)
            } else {
                toward(&worst_point, 0.5)
            };
            let contracted_value = eval(&contracted);
            if contracted_value < worst.min(reflected_value) {
                simplex[dim] = (contracted, contracted_value);
                continue;
            }

            // shrink toward the best vertex
            let best_point = simplex[0].0.clone();
            for (vertex, value) in simplex.iter_mut().skip(1) {
                for (x, b) in vertex.iter_mut().zip(best_point.iter()) {
                    *x = b + 0.5 * (*x - b);
                }
                *value = eval(vertex);
            }
        }

        Err(MathError::NoConvergence(self.max_iterations))
    }
}
