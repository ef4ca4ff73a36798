//! Seasonal ARIMA models with optional exogenous regressors
//!
//! The model is a regression with SARIMA errors. Regressor coefficients are
//! estimated on the differenced data, the remaining error process is
//! differenced by `(1 - B)^d (1 - B^s)^D`, and the ARMA coefficients are
//! chosen by minimising the conditional sum of squares.

use crate::error::{ForecastError, Result};
use crate::models::{is_degenerate, FittedModel, ForecastModel};
use serde::{Deserialize, Serialize};
use trend_math::linalg::{conditioning, least_squares_with_tolerance};
use trend_math::optimize::NelderMead;

/// Starting value for every ARMA coefficient
const INITIAL_COEFFICIENT: f64 = 0.1;

/// Largest AR/MA order accepted per factor
const MAX_ARMA_ORDER: usize = 3;

/// Largest differencing order accepted per factor
const MAX_DIFFERENCING: usize = 2;

/// Smallest `|R_kk| / max |R_jj|` accepted for the differenced regressor
/// design. Below it the coefficients are not identified by the history.
pub const MIN_REGRESSOR_CONDITIONING: f64 = 1e-3;

/// Orders of a multiplicative SARIMA(p,d,q)x(P,D,Q,s) model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
    /// Steps per seasonal cycle; 0 for a non-seasonal model
    pub period: usize,
}

impl SarimaOrder {
    /// ARIMA(p,d,q) with no seasonal factor
    pub fn non_seasonal(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_p: 0,
            seasonal_d: 0,
            seasonal_q: 0,
            period: 0,
        }
    }

    /// SARIMA(1,1,1)x(1,1,1,s)
    pub fn airline(period: usize) -> Self {
        Self {
            p: 1,
            d: 1,
            q: 1,
            seasonal_p: 1,
            seasonal_d: 1,
            seasonal_q: 1,
            period,
        }
    }

    pub fn is_seasonal(&self) -> bool {
        self.seasonal_p + self.seasonal_d + self.seasonal_q > 0
    }

    /// Number of ARMA coefficients to estimate
    pub fn parameter_count(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    pub fn label(&self) -> String {
        if self.is_seasonal() {
            format!(
                "SARIMA({},{},{})x({},{},{},{})",
                self.p, self.d, self.q, self.seasonal_p, self.seasonal_d, self.seasonal_q, self.period
            )
        } else {
            format!("ARIMA({},{},{})", self.p, self.d, self.q)
        }
    }

    fn validate(&self) -> Result<()> {
        let arma = [self.p, self.q, self.seasonal_p, self.seasonal_q];
        if arma.iter().any(|&o| o > MAX_ARMA_ORDER) {
            return Err(ForecastError::InvalidConfig(format!(
                "{}: AR and MA orders are limited to {}",
                self.label(),
                MAX_ARMA_ORDER
            )));
        }
        if self.d > MAX_DIFFERENCING || self.seasonal_d > MAX_DIFFERENCING {
            return Err(ForecastError::InvalidConfig(format!(
                "{}: differencing orders are limited to {}",
                self.label(),
                MAX_DIFFERENCING
            )));
        }
        if self.is_seasonal() && self.period < 2 {
            return Err(ForecastError::InvalidConfig(format!(
                "{}: seasonal factors need a period of at least 2",
                self.label()
            )));
        }
        Ok(())
    }

    /// `(1 - B)^d (1 - B^s)^D` as lag coefficients, lag 0 first
    fn differencing_polynomial(&self) -> Vec<f64> {
        let mut poly = vec![1.0];
        for _ in 0..self.d {
            poly = poly_mul(&poly, &[1.0, -1.0]);
        }
        if self.is_seasonal() {
            let mut seasonal = vec![0.0; self.period + 1];
            seasonal[0] = 1.0;
            seasonal[self.period] = -1.0;
            for _ in 0..self.seasonal_d {
                poly = poly_mul(&poly, &seasonal);
            }
        }
        poly
    }
}

/// Estimated ARMA coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarimaCoefficients {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
}

impl SarimaCoefficients {
    /// Map unconstrained optimiser coordinates into (-1, 1)
    fn from_raw(order: &SarimaOrder, raw: &[f64]) -> Self {
        let mut values = raw.iter().map(|r| r.tanh());
        let mut take = |n: usize| values.by_ref().take(n).collect::<Vec<f64>>();
        Self {
            ar: take(order.p),
            ma: take(order.q),
            seasonal_ar: take(order.seasonal_p),
            seasonal_ma: take(order.seasonal_q),
        }
    }

    /// `(1 - φ₁B - ...)(1 - Φ₁B^s - ...)`
    fn ar_polynomial(&self, period: usize) -> Vec<f64> {
        poly_mul(
            &lag_polynomial(&self.ar, 1, -1.0),
            &lag_polynomial(&self.seasonal_ar, period, -1.0),
        )
    }

    /// `(1 + θ₁B + ...)(1 + Θ₁B^s + ...)`
    fn ma_polynomial(&self, period: usize) -> Vec<f64> {
        poly_mul(
            &lag_polynomial(&self.ma, 1, 1.0),
            &lag_polynomial(&self.seasonal_ma, period, 1.0),
        )
    }
}

/// Unfitted SARIMA model
#[derive(Debug, Clone)]
pub struct SarimaModel {
    name: String,
    order: SarimaOrder,
    optimizer: NelderMead,
}

impl SarimaModel {
    pub fn new(order: SarimaOrder) -> Result<Self> {
        order.validate()?;
        Ok(Self {
            name: order.label(),
            order,
            optimizer: NelderMead::default(),
        })
    }

    pub fn with_optimizer(mut self, optimizer: NelderMead) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn order(&self) -> &SarimaOrder {
        &self.order
    }

    /// Shortest history `fit` accepts, before any regressor requirement
    pub fn required_observations(&self) -> usize {
        self.order.differencing_polynomial().len() - 1 + self.order.parameter_count() + 2
    }

    /// Whether `rows` leave enough differenced observations, and a well
    /// enough conditioned design, for their coefficients to be estimated
    pub fn regressors_identifiable(&self, rows: &[Vec<f64>]) -> bool {
        let design = differenced_design(&self.order.differencing_polynomial(), rows);
        let width = rows.first().map_or(0, Vec::len);
        design.len() > width
            && conditioning(&design).is_ok_and(|ratio| ratio >= MIN_REGRESSOR_CONDITIONING)
    }

    /// Regressor coefficients estimated on the differenced series
    fn regress(&self, values: &[f64], rows: &[Vec<f64>], diff: &[f64]) -> Result<Vec<f64>> {
        if rows.len() != values.len() {
            return Err(ForecastError::InvalidSeries(format!(
                "{} regressor rows for {} observations",
                rows.len(),
                values.len()
            )));
        }
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return Err(ForecastError::InvalidSeries(
                "regressor rows differ in width".to_string(),
            ));
        }
        if width == 0 {
            return Ok(Vec::new());
        }

        let dy = apply_filter(diff, values);
        let dx = differenced_design(diff, rows);
        if dy.len() <= width {
            return Err(ForecastError::ForecastFit(format!(
                "{} differenced observations cannot identify {} regressors",
                dy.len(),
                width
            )));
        }

        Ok(least_squares_with_tolerance(&dx, &dy, MIN_REGRESSOR_CONDITIONING)?)
    }
}

impl ForecastModel for SarimaModel {
    type Fitted = FittedSarima;

    fn fit(&self, values: &[f64], exog: Option<&[Vec<f64>]>) -> Result<FittedSarima> {
        let diff = self.order.differencing_polynomial();
        let needed = self.required_observations();
        if values.len() < needed {
            return Err(ForecastError::ForecastFit(format!(
                "{} needs at least {} observations, have {}",
                self.name,
                needed,
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidSeries(
                "series contains non-finite values".to_string(),
            ));
        }
        if is_degenerate(values) {
            return Err(ForecastError::ForecastFit(format!(
                "{}: series is constant, nothing to fit",
                self.name
            )));
        }

        let beta = match exog {
            Some(rows) => self.regress(values, rows, &diff)?,
            None => Vec::new(),
        };
        let z: Vec<f64> = match exog {
            Some(rows) if !beta.is_empty() => values
                .iter()
                .zip(rows.iter())
                .map(|(y, row)| y - dot(row, &beta))
                .collect(),
            _ => values.to_vec(),
        };
        let w = apply_filter(&diff, &z);

        let order = self.order;
        let objective = |raw: &[f64]| {
            let coefficients = SarimaCoefficients::from_raw(&order, raw);
            let residuals = css_residuals(
                &w,
                &coefficients.ar_polynomial(order.period),
                &coefficients.ma_polynomial(order.period),
            );
            residuals.iter().map(|e| e * e).sum::<f64>() / residuals.len() as f64
        };

        let start = vec![INITIAL_COEFFICIENT.atanh(); order.parameter_count()];
        let minimum = self.optimizer.minimize(objective, &start)?;
        if !minimum.value.is_finite() {
            return Err(ForecastError::ForecastFit(format!(
                "{}: conditional sum of squares is not finite",
                self.name
            )));
        }

        let coefficients = SarimaCoefficients::from_raw(&order, &minimum.point);
        let ar_poly = coefficients.ar_polynomial(order.period);
        let ma_poly = coefficients.ma_polynomial(order.period);
        let residuals = css_residuals(&w, &ar_poly, &ma_poly);

        tracing::debug!(
            model = %self.name,
            observations = values.len(),
            regressors = beta.len(),
            iterations = minimum.iterations,
            residual_variance = minimum.value,
            "fitted seasonal ARIMA"
        );

        Ok(FittedSarima {
            name: self.name.clone(),
            order,
            coefficients,
            beta,
            differencing: diff,
            ar_poly,
            ma_poly,
            errors: z,
            differenced: w,
            residuals,
            residual_variance: minimum.value,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// SARIMA model fitted to a history
#[derive(Debug, Clone)]
pub struct FittedSarima {
    name: String,
    order: SarimaOrder,
    coefficients: SarimaCoefficients,
    /// Regressor coefficients, empty without exogenous input
    beta: Vec<f64>,
    differencing: Vec<f64>,
    ar_poly: Vec<f64>,
    ma_poly: Vec<f64>,
    /// History with the regression part removed
    errors: Vec<f64>,
    /// `errors` after differencing
    differenced: Vec<f64>,
    residuals: Vec<f64>,
    residual_variance: f64,
}

impl FittedSarima {
    pub fn order(&self) -> &SarimaOrder {
        &self.order
    }

    pub fn coefficients(&self) -> &SarimaCoefficients {
        &self.coefficients
    }

    pub fn regression_coefficients(&self) -> &[f64] {
        &self.beta
    }

    /// In-sample one-step residuals of the differenced error process
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn residual_variance(&self) -> f64 {
        self.residual_variance
    }

    fn regression_part(&self, horizon: usize, future_exog: Option<&[Vec<f64>]>) -> Result<Vec<f64>> {
        if self.beta.is_empty() {
            return Ok(vec![0.0; horizon]);
        }
        let rows = future_exog.ok_or_else(|| {
            ForecastError::InvalidConfig(format!(
                "{} was fit with {} regressors; future rows are required",
                self.name,
                self.beta.len()
            ))
        })?;
        if rows.len() != horizon || rows.iter().any(|r| r.len() != self.beta.len()) {
            return Err(ForecastError::InvalidConfig(format!(
                "expected {} future regressor rows of width {}",
                horizon,
                self.beta.len()
            )));
        }
        Ok(rows.iter().map(|row| dot(row, &self.beta)).collect())
    }
}

impl FittedModel for FittedSarima {
    /// `future_exog` is ignored when the model was fit without regressors.
    fn forecast(&self, horizon: usize, future_exog: Option<&[Vec<f64>]>) -> Result<Vec<f64>> {
        let regression = self.regression_part(horizon, future_exog)?;

        let mut w = self.differenced.clone();
        let mut e = self.residuals.clone();
        for _ in 0..horizon {
            let t = w.len();
            let mut next = 0.0;
            for (k, a) in self.ar_poly.iter().enumerate().skip(1).take_while(|(k, _)| *k <= t) {
                next -= a * w[t - k];
            }
            for (k, m) in self.ma_poly.iter().enumerate().skip(1).take_while(|(k, _)| *k <= t) {
                next += m * e[t - k];
            }
            w.push(next);
            e.push(0.0);
        }

        // undo the differencing
        let history = self.errors.len();
        let mut z = self.errors.clone();
        for step in 0..horizon {
            let t = z.len();
            let mut next = w[self.differenced.len() + step];
            for (k, c) in self.differencing.iter().enumerate().skip(1) {
                next -= c * z[t - k];
            }
            z.push(next);
        }

        let forecast: Vec<f64> = z[history..]
            .iter()
            .zip(regression.iter())
            .map(|(z, r)| z + r)
            .collect();

        if forecast.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ForecastFit(format!(
                "{} produced a non-finite forecast",
                self.name
            )));
        }
        Ok(forecast)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// One-step residuals with pre-sample values taken as zero
fn css_residuals(w: &[f64], ar_poly: &[f64], ma_poly: &[f64]) -> Vec<f64> {
    let mut e: Vec<f64> = Vec::with_capacity(w.len());
    for t in 0..w.len() {
        let mut value = w[t];
        for (k, a) in ar_poly.iter().enumerate().skip(1).take_while(|(k, _)| *k <= t) {
            value += a * w[t - k];
        }
        for (k, m) in ma_poly.iter().enumerate().skip(1).take_while(|(k, _)| *k <= t) {
            value -= m * e[t - k];
        }
        e.push(value);
    }
    e
}

/// `1 + sign·c₁B^step + sign·c₂B^(2·step) + ...`
fn lag_polynomial(coefficients: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coefficients.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Each regressor column filtered by `poly`, one row per full lag window
fn differenced_design(poly: &[f64], rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let lags = poly.len() - 1;
    let width = rows.first().map_or(0, Vec::len);
    (lags..rows.len())
        .map(|t| {
            (0..width)
                .map(|j| poly.iter().enumerate().map(|(k, c)| c * rows[t - k][j]).sum())
                .collect()
        })
        .collect()
}

/// `Σ poly[k]·values[t-k]` for every `t` with a full lag window
fn apply_filter(poly: &[f64], values: &[f64]) -> Vec<f64> {
    let lags = poly.len() - 1;
    (lags..values.len())
        .map(|t| poly.iter().enumerate().map(|(k, c)| c * values[t - k]).sum())
        .collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
