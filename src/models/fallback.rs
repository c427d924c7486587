//! Graceful degradation for forecasting degenerate series.
//!
//! Every series in a run goes through the same ladder:
//!
//! | history length | result                                   |
//! |----------------|------------------------------------------|
//! | 0              | zeros                                    |
//! | 1              | the single value, repeated               |
//! | 2 or more      | the fitted model, or zeros if it fails   |
//!
//! Model failures are logged and counted but never returned, so one pathological
//! leaf cannot abort a run over thousands of them.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ForecastError;
use crate::models::arima::{ArimaOrder, ARIMA};
use crate::models::Forecaster;

/// Which rung of the ladder produced a forecast.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesOutcome {
    /// No history; the forecast is zero.
    Empty,
    /// A single observation carried forward unchanged.
    Carried,
    /// The model was fitted and projected.
    Modelled,
    /// The model failed; the forecast is zero.
    FellBack(ForecastError),
}

/// Point forecasts together with the rung that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesForecast {
    pub values: Vec<f64>,
    pub outcome: SeriesOutcome,
}

/// Counts of how many series took each rung.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackStats {
    pub modelled: usize,
    pub carried: usize,
    pub empty: usize,
    pub fell_back: usize,
}

impl FallbackStats {
    /// Count one outcome.
    pub fn record(&mut self, outcome: &SeriesOutcome) {
        match outcome {
            SeriesOutcome::Empty => self.empty += 1,
            SeriesOutcome::Carried => self.carried += 1,
            SeriesOutcome::Modelled => self.modelled += 1,
            SeriesOutcome::FellBack(_) => self.fell_back += 1,
        }
    }

    /// Add another set of counts.
    pub fn merge(&mut self, other: &FallbackStats) {
        self.modelled += other.modelled;
        self.carried += other.carried;
        self.empty += other.empty;
        self.fell_back += other.fell_back;
    }

    /// Total number of series seen.
    pub fn total(&self) -> usize {
        self.modelled + self.carried + self.empty + self.fell_back
    }
}

/// Fallback policy wrapping an ARIMA model of a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    order: ArimaOrder,
}

impl FallbackPolicy {
    /// Create a policy that fits models of the given order.
    pub fn new(order: ArimaOrder) -> Self {
        Self { order }
    }

    /// The model order used for histories of two or more points.
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Forecast `steps` points from `history`.
    pub fn resolve(&self, history: &[f64], steps: usize) -> SeriesForecast {
        let mut model = ARIMA::with_order(self.order);
        self.resolve_with(&mut model, history, steps)
    }

    /// Forecast the next single point from `history`.
    pub fn resolve_next(&self, history: &[f64]) -> SeriesForecast {
        self.resolve(history, 1)
    }

    /// Run the ladder with a caller-supplied model.
    pub fn resolve_with(
        &self,
        model: &mut dyn Forecaster,
        history: &[f64],
        steps: usize,
    ) -> SeriesForecast {
        match history {
            [] => SeriesForecast {
                values: vec![0.0; steps],
                outcome: SeriesOutcome::Empty,
            },
            [only] => SeriesForecast {
                values: vec![*only; steps],
                outcome: SeriesOutcome::Carried,
            },
            _ => match model.fit(history).and_then(|_| model.predict(steps)) {
                Ok(values) => SeriesForecast {
                    values,
                    outcome: SeriesOutcome::Modelled,
                },
                Err(err) => {
                    warn!(
                        model = model.name(),
                        order = %self.order,
                        len = history.len(),
                        error = %err,
                        "forecast failed, falling back to zero"
                    );
                    SeriesForecast {
                        values: vec![0.0; steps],
                        outcome: SeriesOutcome::FellBack(err),
                    }
                }
            },
        }
    }
}
