//! ARIMA (Autoregressive Integrated Moving Average) model.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, integrate};
use crate::models::arima::kalman::ArmaStateSpace;
use crate::models::arima::transform::{constrain_invertible, constrain_stationary};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{is_constant, mean};

/// ARIMA model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ArimaOrder {
    /// Create a new ARIMA order.
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Whether a constant term is estimated. Only undifferenced models carry one.
    pub fn has_constant(&self) -> bool {
        self.d == 0
    }

    /// Number of estimated mean-equation parameters.
    pub fn num_params(&self) -> usize {
        self.p + self.q + usize::from(self.has_constant())
    }
}

impl std::fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// ARIMA forecasting model estimated by exact maximum likelihood.
///
/// The `d`-times differenced series is treated as a zero-mean (or constant-mean when
/// `d == 0`) ARMA(p, q) process. Its Gaussian likelihood is evaluated with a Kalman
/// filter started from the stationary state distribution, and maximized with
/// Nelder-Mead over the partial-autocorrelation parameterization.
#[derive(Debug, Clone)]
pub struct ARIMA {
    order: ArimaOrder,
    optimizer: NelderMeadConfig,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    intercept: f64,
    sigma2: Option<f64>,
    log_likelihood: Option<f64>,
    /// Original series (for integration).
    original: Option<Vec<f64>>,
    /// Predicted ARMA state for the first forecast step.
    next_state: Option<Vec<f64>>,
    iterations: usize,
}

impl ARIMA {
    /// Create a new ARIMA model.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::with_order(ArimaOrder::new(p, d, q))
    }

    /// Create an unfitted model for an order.
    pub fn with_order(order: ArimaOrder) -> Self {
        Self {
            order,
            optimizer: NelderMeadConfig {
                max_iter: 5000,
                tolerance: 1e-8,
                ..Default::default()
            },
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            intercept: 0.0,
            sigma2: None,
            log_likelihood: None,
            original: None,
            next_state: None,
            iterations: 0,
        }
    }

    /// Replace the optimizer settings.
    pub fn with_optimizer(mut self, config: NelderMeadConfig) -> Self {
        self.optimizer = config;
        self
    }

    /// Get the model order.
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Get AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Get MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Get the intercept (zero for differenced models).
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Innovation variance estimate.
    pub fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    /// Maximized log-likelihood.
    pub fn log_likelihood(&self) -> Option<f64> {
        self.log_likelihood
    }

    /// Akaike information criterion (the innovation variance counts as a parameter).
    pub fn aic(&self) -> Option<f64> {
        let k = (self.order.num_params() + 1) as f64;
        self.log_likelihood.map(|ll| -2.0 * ll + 2.0 * k)
    }

    /// Optimizer iterations used by the last fit.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Split an optimizer vector into (intercept, ar, ma).
    fn unpack(order: ArimaOrder, params: &[f64]) -> (f64, Vec<f64>, Vec<f64>) {
        let offset = usize::from(order.has_constant());
        let intercept = if offset == 1 { params[0] } else { 0.0 };
        let ar = constrain_stationary(&params[offset..offset + order.p]);
        let ma = constrain_invertible(&params[offset + order.p..]);
        (intercept, ar, ma)
    }

    /// Negative concentrated log-likelihood, or `+inf` when it cannot be evaluated.
    fn negative_log_likelihood(order: ArimaOrder, working: &[f64], params: &[f64]) -> f64 {
        let (intercept, ar, ma) = Self::unpack(order, params);
        let centered: Vec<f64> = working.iter().map(|w| w - intercept).collect();
        match ArmaStateSpace::new(&ar, &ma).filter(&centered) {
            Some(out) if out.sum_sq > 0.0 => -out.log_likelihood(),
            _ => f64::INFINITY,
        }
    }

    /// Estimate parameters on the differenced series.
    fn estimate_parameters(&mut self, working: &[f64]) -> Result<()> {
        let order = self.order;
        let n_params = order.num_params();

        let params = if n_params == 0 {
            vec![]
        } else {
            let mut initial = Vec::with_capacity(n_params);
            if order.has_constant() {
                initial.push(mean(working));
            }
            // Small positive starting autocorrelations, as in conditional least squares
            initial.extend((0..order.p).map(|i| 0.1 / (i + 1) as f64));
            initial.extend((0..order.q).map(|i| 0.1 / (i + 1) as f64));

            let result = nelder_mead(
                |params| Self::negative_log_likelihood(order, working, params),
                &initial,
                self.optimizer.clone(),
            );
            self.iterations = result.iterations;

            if !result.converged {
                return Err(ForecastError::ConvergenceFailure {
                    iterations: result.iterations,
                });
            }
            result.optimal_point
        };

        let (intercept, ar, ma) = Self::unpack(order, &params);
        let centered: Vec<f64> = working.iter().map(|w| w - intercept).collect();
        let state_space = ArmaStateSpace::new(&ar, &ma);
        let out = state_space
            .filter(&centered)
            .filter(|out| out.sum_sq > 0.0 && out.sum_sq.is_finite())
            .ok_or_else(|| {
                ForecastError::ComputationError("likelihood could not be evaluated".to_string())
            })?;

        self.intercept = intercept;
        self.ar_coefficients = ar;
        self.ma_coefficients = ma;
        self.sigma2 = Some(out.sigma2());
        self.log_likelihood = Some(out.log_likelihood());
        self.next_state = Some(out.next_state);
        Ok(())
    }
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &[f64]) -> Result<()> {
        let d = self.order.d;
        if series.len() <= d {
            return Err(ForecastError::InsufficientData {
                needed: d + 1,
                got: series.len(),
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "series contains non-finite values".to_string(),
            ));
        }
        if is_constant(series) {
            return Err(ForecastError::ZeroVariance);
        }

        let working = difference(series, d);
        self.estimate_parameters(&working)?;
        self.original = Some(series.to_vec());

        debug!(
            order = %self.order,
            n = series.len(),
            iterations = self.iterations,
            sigma2 = self.sigma2.unwrap_or(f64::NAN),
            "fitted ARIMA"
        );
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let state = self.next_state.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(vec![]);
        }

        let state_space = ArmaStateSpace::new(&self.ar_coefficients, &self.ma_coefficients);
        let forecast_diff: Vec<f64> = state_space
            .project(state, horizon)
            .into_iter()
            .map(|w| w + self.intercept)
            .collect();

        let predictions = integrate(&forecast_diff, original, self.order.d);
        if predictions.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "forecast is not finite".to_string(),
            ));
        }
        Ok(predictions)
    }

    fn name(&self) -> &str {
        "ARIMA"
    }

    fn is_fitted(&self) -> bool {
        self.next_state.is_some()
    }
}

/// Fit an ARIMA model of the given order and forecast `steps` points.
///
/// Every numerical failure is returned to the caller; see
/// [`FallbackPolicy`](crate::models::FallbackPolicy) for the degradation ladder.
///
/// # Example
/// ```
/// use incidence_forecast::models::arima::{forecast, ArimaOrder};
///
/// let history = [12.0, 15.0, 14.0, 18.0, 21.0, 19.0, 24.0, 26.0];
/// let next = forecast(&history, 3, ArimaOrder::new(1, 1, 0)).unwrap();
/// assert_eq!(next.len(), 3);
/// ```
pub fn forecast(series: &[f64], steps: usize, order: ArimaOrder) -> Result<Vec<f64>> {
    let mut model = ARIMA::with_order(order);
    model.fit(series)?;
    model.predict(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Deterministic pseudo-random noise in [-0.5, 0.5).
    fn noise(i: usize) -> f64 {
        let x = (i as f64 * 12.9898).sin() * 43758.5453;
        x - x.floor() - 0.5
    }

    fn trending(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 10.0 + 0.5 * i as f64 + 4.0 * noise(i))
            .collect()
    }

    #[test]
    fn arima_basic_fit() {
        let mut model = ARIMA::new(1, 1, 1);
        model.fit(&trending(50)).unwrap();

        assert_eq!(model.ar_coefficients().len(), 1);
        assert_eq!(model.ma_coefficients().len(), 1);
        assert!(model.is_fitted());

        let forecast = model.predict(5).unwrap();
        assert_eq!(forecast.len(), 5);
        assert!(forecast.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn arima_recovers_ar1_coefficient() {
        // y_t = 0.7 y_{t-1} + e_t
        let mut values = vec![0.0];
        for i in 1..200 {
            values.push(0.7 * values[i - 1] + noise(i));
        }

        let mut model = ARIMA::new(1, 0, 0);
        model.fit(&values).unwrap();

        assert!(model.ar_coefficients()[0] > 0.4);
        assert!(model.ar_coefficients()[0] < 0.95);
    }

    #[test]
    fn coefficients_stay_stationary_and_invertible() {
        let mut model = ARIMA::new(3, 1, 2);
        model.fit(&trending(60)).unwrap();

        assert!(model.sigma2().unwrap().is_finite());
        assert_eq!(model.ar_coefficients().len(), 3);
        assert_eq!(model.ma_coefficients().len(), 2);
        assert_eq!(model.predict(12).unwrap().len(), 12);
    }

    #[test]
    fn differenced_model_continues_trend() {
        let values: Vec<f64> = (0..30).map(|i| 10.0 + 2.0 * i as f64 + (i % 3) as f64).collect();
        let mut model = ARIMA::new(1, 1, 0);
        model.fit(&values).unwrap();

        let forecast = model.predict(3).unwrap();
        let last = *values.last().unwrap();
        assert!(forecast[0] > last - 5.0);
        assert_relative_eq!(model.intercept(), 0.0);
    }

    #[test]
    fn undifferenced_model_estimates_mean() {
        let values: Vec<f64> = (0..40).map(|i| 50.0 + if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let mut model = ARIMA::new(0, 0, 0);
        model.fit(&values).unwrap();

        assert_relative_eq!(model.intercept(), 50.0, epsilon = 1e-9);
        let forecast = model.predict(2).unwrap();
        assert_relative_eq!(forecast[0], 50.0, epsilon = 1e-9);
    }

    #[test]
    fn two_point_series_is_modelled() {
        let forecast = forecast(&[5.0, 3.0], 1, ArimaOrder::new(1, 1, 0)).unwrap();
        assert_eq!(forecast.len(), 1);
        assert!(forecast[0].is_finite());
        // AR(1) on a single differenced value pulls towards the last observation
        assert!(forecast[0] > 1.0 && forecast[0] < 5.0);
    }

    #[test]
    fn constant_series_has_zero_variance() {
        assert!(matches!(
            forecast(&[4.0, 4.0, 4.0], 1, ArimaOrder::new(1, 1, 0)),
            Err(ForecastError::ZeroVariance)
        ));
    }

    #[test]
    fn too_short_to_difference() {
        assert!(matches!(
            forecast(&[4.0], 1, ArimaOrder::new(1, 1, 0)),
            Err(ForecastError::InsufficientData { needed: 2, got: 1 })
        ));
    }

    #[test]
    fn non_finite_input_is_rejected() {
        assert!(matches!(
            forecast(&[1.0, f64::NAN, 3.0], 1, ArimaOrder::new(1, 1, 0)),
            Err(ForecastError::ComputationError(_))
        ));
    }

    #[test]
    fn optimizer_cap_surfaces_convergence_failure() {
        let config = NelderMeadConfig {
            max_iter: 1,
            ..Default::default()
        };
        let mut model = ARIMA::new(3, 1, 2).with_optimizer(config);
        assert!(matches!(
            model.fit(&trending(40)),
            Err(ForecastError::ConvergenceFailure { iterations: 1 })
        ));
    }

    #[test]
    fn arima_requires_fit() {
        let model = ARIMA::new(1, 1, 0);
        assert!(matches!(model.predict(5), Err(ForecastError::FitRequired)));
    }

    #[test]
    fn arima_zero_horizon() {
        let mut model = ARIMA::new(1, 1, 0);
        model.fit(&trending(20)).unwrap();
        assert!(model.predict(0).unwrap().is_empty());
    }

    #[test]
    fn information_criteria_available_after_fit() {
        let mut model = ARIMA::new(1, 0, 1);
        assert!(model.aic().is_none());
        model.fit(&trending(40)).unwrap();
        assert!(model.log_likelihood().is_some());
        assert!(model.aic().unwrap().is_finite());
    }

    #[test]
    fn order_parameters() {
        assert_eq!(ArimaOrder::new(3, 1, 2).num_params(), 5);
        assert_eq!(ArimaOrder::new(1, 0, 1).num_params(), 3);
        assert_eq!(ArimaOrder::new(1, 1, 0).to_string(), "(1,1,0)");
    }

    #[test]
    fn arima_default_and_name() {
        let model = ARIMA::default();
        assert_eq!(model.order(), ArimaOrder::new(1, 1, 0));
        assert_eq!(model.name(), "ARIMA");
        assert!(!model.is_fitted());
    }
}
