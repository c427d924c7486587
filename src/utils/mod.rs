//! Numerical helpers shared by the models and evaluators.

pub mod linalg;
pub mod metrics;
pub mod optimization;
pub mod stats;

pub use metrics::{effectiveness, mape};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::to_count;
