//! Forecasting models.

mod traits;

pub mod arima;
pub mod fallback;

pub use fallback::{FallbackPolicy, FallbackStats, SeriesForecast, SeriesOutcome};
pub use traits::{BoxedForecaster, Forecaster};
