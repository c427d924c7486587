//! ARIMA (Autoregressive Integrated Moving Average) models.
//!
//! This module provides:
//! - exact maximum-likelihood ARIMA(p, d, q) estimation
//! - the [`forecast`] entry point used wherever a series is projected forward

mod diff;
mod kalman;
mod model;
mod transform;

pub use diff::{difference, integrate};
pub use kalman::{ArmaStateSpace, FilterOutput};
pub use model::{forecast, ArimaOrder, ARIMA};
pub use transform::{constrain_invertible, constrain_stationary};
