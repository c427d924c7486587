//! Accuracy metrics for backtest evaluation.

use crate::error::{ForecastError, Result};

/// Mean Absolute Percentage Error, in percent.
///
/// Each term is `|actual - predicted| / max(|actual|, f64::EPSILON)`, so a zero actual
/// yields a very large error instead of a division by zero.
pub fn mape(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs() / a.abs().max(f64::EPSILON))
        .sum();

    Ok(100.0 * sum / actual.len() as f64)
}

/// Effectiveness score derived from a MAPE value: `max(0, 100 - mape)`.
pub fn effectiveness(mape: f64) -> f64 {
    if mape.is_nan() {
        return 0.0;
    }
    (100.0 - mape).clamp(0.0, 100.0)
}
