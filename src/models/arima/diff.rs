//! Differencing utilities for ARIMA models.

/// Apply differencing `d` times.
///
/// Each pass shortens the series by one; a series with `d` or fewer points comes
/// back empty.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.is_empty() {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Integrate (reverse differencing) forecasts made on the `d`-times differenced scale.
///
/// `original` is the undifferenced history the forecasts continue from.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || differenced.is_empty() {
        return differenced.to_vec();
    }

    // Last observed value at every differencing level below d.
    let anchors: Vec<f64> = (0..d)
        .map(|level| difference(original, level).last().copied().unwrap_or(0.0))
        .collect();

    let mut result = differenced.to_vec();
    for anchor in anchors.iter().rev() {
        let mut level = *anchor;
        for value in result.iter_mut() {
            level += *value;
            *value = level;
        }
    }
    result
}
