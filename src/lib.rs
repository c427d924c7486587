//! # incidence-forecast
//!
//! Hierarchical aggregation and recursive forecasting of incident records.
//!
//! Records are rolled up into a nested count tree (year, location, sex, category,
//! intentionality) and every count series in the tree is forecast one period ahead
//! with an ARIMA model. Per-sex monthly series get a twelve-month forecast and a
//! holdout backtest. Series too short or too degenerate to model fall back to simple
//! defaults instead of failing the run.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod aggregate;
pub mod config;
pub mod core;
pub mod error;
pub mod forecast;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::aggregate::{aggregate, aggregate_with, CountTree, LeafCounts, Node, TreeLayout};
    pub use crate::config::PipelineConfig;
    pub use crate::core::{monthly_totals, MonthlySeries, MonthlyTotal, Record, Sex, YearMonth};
    pub use crate::error::{ForecastError, Result};
    pub use crate::forecast::{
        evaluate, forecast_tree, forecast_year, EffectivenessReport, ForecastPoint, TreeForecast,
    };
    pub use crate::models::arima::{ArimaOrder, ARIMA};
    pub use crate::models::{FallbackPolicy, Forecaster};
    pub use crate::pipeline::{Pipeline, PipelineOutput};
}
