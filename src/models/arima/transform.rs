//! Reparameterizations that keep ARMA coefficients stationary and invertible.
//!
//! The optimizer works on unconstrained reals. Each value is squashed into a partial
//! autocorrelation in (-1, 1) and the Durbin-Levinson recursion turns the partial
//! autocorrelations into polynomial coefficients whose roots lie outside the unit circle.

/// Map unconstrained values to stationary AR coefficients.
pub fn constrain_stationary(unconstrained: &[f64]) -> Vec<f64> {
    let mut coefs: Vec<f64> = Vec::with_capacity(unconstrained.len());
    for &u in unconstrained {
        let r = u / (1.0 + u * u).sqrt();
        let previous = coefs.clone();
        let k = previous.len();
        for j in 0..k {
            coefs[j] = previous[j] - r * previous[k - 1 - j];
        }
        coefs.push(r);
    }
    coefs
}

/// Map unconstrained values to invertible MA coefficients.
///
/// `1 + theta_1 B + ... + theta_q B^q` is invertible exactly when `theta = -phi` for
/// some stationary `phi`.
pub fn constrain_invertible(unconstrained: &[f64]) -> Vec<f64> {
    constrain_stationary(unconstrained)
        .into_iter()
        .map(|c| -c)
        .collect()
}
