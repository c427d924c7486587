//! Exact ARMA likelihood via a Kalman filter on the state-space form.

use crate::utils::linalg::{matmul, matvec, solve_discrete_lyapunov, transpose, Matrix};

/// ARMA(p, q) in Harvey's state-space form with unit innovation variance.
///
/// State dimension is `max(p, q + 1)`. The transition matrix carries the AR
/// coefficients in its first column and an identity on the superdiagonal; the
/// selection vector is `[1, theta_1, ..., theta_q]`.
#[derive(Debug, Clone)]
pub struct ArmaStateSpace {
    transition: Matrix,
    selection: Vec<f64>,
}

/// Accumulated innovations of one filtering pass.
#[derive(Debug, Clone)]
pub struct FilterOutput {
    /// Number of filtered observations.
    pub n: usize,
    /// Sum of `ln F_t` over the innovation variances.
    pub sum_log_f: f64,
    /// Sum of standardized squared innovations `v_t^2 / F_t`.
    pub sum_sq: f64,
    /// Predicted state for the first out-of-sample period.
    pub next_state: Vec<f64>,
}

impl FilterOutput {
    /// Maximum-likelihood innovation variance.
    pub fn sigma2(&self) -> f64 {
        self.sum_sq / self.n as f64
    }

    /// Gaussian log-likelihood with the innovation variance concentrated out.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.n as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + self.sigma2().ln() + 1.0)
            - 0.5 * self.sum_log_f
    }
}

impl ArmaStateSpace {
    /// Build the state-space form for the given coefficients.
    pub fn new(ar: &[f64], ma: &[f64]) -> Self {
        let r = ar.len().max(ma.len() + 1);
        let mut transition = vec![vec![0.0; r]; r];
        for (i, row) in transition.iter_mut().enumerate() {
            if let Some(&phi) = ar.get(i) {
                row[0] = phi;
            }
            if i + 1 < r {
                row[i + 1] = 1.0;
            }
        }

        let mut selection = vec![0.0; r];
        selection[0] = 1.0;
        for (i, &theta) in ma.iter().enumerate() {
            selection[i + 1] = theta;
        }

        Self {
            transition,
            selection,
        }
    }

    /// State dimension.
    pub fn dim(&self) -> usize {
        self.selection.len()
    }

    /// Run the filter over a zero-mean series.
    ///
    /// Starts from the stationary distribution of the state. Returns `None` when that
    /// distribution does not exist or an innovation variance degenerates.
    pub fn filter(&self, observations: &[f64]) -> Option<FilterOutput> {
        let r = self.dim();
        let rr: Matrix = self
            .selection
            .iter()
            .map(|a| self.selection.iter().map(|b| a * b).collect())
            .collect();
        let t_transposed = transpose(&self.transition);

        let mut cov = solve_discrete_lyapunov(&self.transition, &rr)?;
        let mut state = vec![0.0; r];
        let mut sum_log_f = 0.0;
        let mut sum_sq = 0.0;

        for &obs in observations {
            let f = cov[0][0];
            if !(f.is_finite() && f > 0.0) {
                return None;
            }
            let v = obs - state[0];
            let gain: Vec<f64> = cov.iter().map(|row| row[0] / f).collect();

            let updated_state: Vec<f64> = state.iter().zip(&gain).map(|(a, k)| a + k * v).collect();
            let mut updated_cov = cov.clone();
            for i in 0..r {
                for j in 0..r {
                    updated_cov[i][j] -= gain[i] * cov[0][j];
                }
            }

            state = matvec(&self.transition, &updated_state);
            cov = matmul(&matmul(&self.transition, &updated_cov), &t_transposed);
            for i in 0..r {
                for j in 0..r {
                    cov[i][j] += rr[i][j];
                }
            }

            sum_log_f += f.ln();
            sum_sq += v * v / f;
        }

        Some(FilterOutput {
            n: observations.len(),
            sum_log_f,
            sum_sq,
            next_state: state,
        })
    }

    /// Point forecasts from a predicted state, `horizon` steps ahead.
    pub fn project(&self, state: &[f64], horizon: usize) -> Vec<f64> {
        let mut current = state.to_vec();
        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            out.push(current[0]);
            current = matvec(&self.transition, &current);
        }
        out
    }
}
