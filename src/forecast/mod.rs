//! Forecasts built on the fallback policy: count trees, annual strata, and backtests.

mod annual;
mod backtest;
mod tree;

pub use annual::{forecast_year, forecast_year_with, AnnualForecast, ForecastPoint};
pub use backtest::{evaluate, evaluate_with, EffectivenessReport};
pub use tree::{forecast_tree, forecast_tree_with, TreeForecast};
