//! Run configuration.

use serde::{Deserialize, Serialize};

use crate::aggregate::TreeLayout;
use crate::error::{ForecastError, Result};
use crate::models::arima::ArimaOrder;

/// Model order used for every tree leaf.
pub const LEAF_ORDER: ArimaOrder = ArimaOrder::new(1, 1, 0);

/// Model order used for the annual per-stratum forecast.
pub const ANNUAL_ORDER: ArimaOrder = ArimaOrder::new(3, 1, 2);

/// Model order used when backtesting.
pub const BACKTEST_ORDER: ArimaOrder = ArimaOrder::new(1, 1, 0);

/// Months held out of training by the backtest.
pub const DEFAULT_HOLDOUT: usize = 14;

/// Months forecast for the upcoming year.
pub const DEFAULT_HORIZON: usize = 12;

/// Distinct years of history fed to the annual forecast.
pub const DEFAULT_HISTORY_YEARS: usize = 5;

/// Configuration for a full aggregation and forecasting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Dimension layout of the count tree.
    pub layout: TreeLayout,
    /// Order fitted to each tree leaf history.
    pub leaf_order: ArimaOrder,
    /// Order fitted to each annual stratum series.
    pub annual_order: ArimaOrder,
    /// Order fitted to each backtest training series.
    pub backtest_order: ArimaOrder,
    /// Points held out for the backtest.
    pub holdout: usize,
    /// Steps forecast for the upcoming year.
    pub horizon: usize,
    /// Calendar years, ending at the latest observed one, kept for the annual forecast.
    pub history_years: usize,
    /// Insert zero counts for months without records before forecasting.
    pub fill_missing_months: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            layout: TreeLayout::Violence,
            leaf_order: LEAF_ORDER,
            annual_order: ANNUAL_ORDER,
            backtest_order: BACKTEST_ORDER,
            holdout: DEFAULT_HOLDOUT,
            horizon: DEFAULT_HORIZON,
            history_years: DEFAULT_HISTORY_YEARS,
            fill_missing_months: false,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tree layout.
    pub fn with_layout(mut self, layout: TreeLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_leaf_order(mut self, order: ArimaOrder) -> Self {
        self.leaf_order = order;
        self
    }

    pub fn with_annual_order(mut self, order: ArimaOrder) -> Self {
        self.annual_order = order;
        self
    }

    pub fn with_backtest_order(mut self, order: ArimaOrder) -> Self {
        self.backtest_order = order;
        self
    }

    /// Set the backtest holdout length.
    pub fn with_holdout(mut self, holdout: usize) -> Self {
        self.holdout = holdout;
        self
    }

    /// Set the annual forecast horizon.
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set how many calendar years of history the annual forecast keeps.
    pub fn with_history_years(mut self, years: usize) -> Self {
        self.history_years = years;
        self
    }

    /// Zero-fill months without records.
    pub fn with_fill_missing_months(mut self, fill: bool) -> Self {
        self.fill_missing_months = fill;
        self
    }

    /// Reject settings that cannot produce a forecast.
    pub fn validate(&self) -> Result<()> {
        if self.holdout == 0 {
            return Err(ForecastError::InvalidParameter(
                "holdout must be positive".to_string(),
            ));
        }
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be positive".to_string(),
            ));
        }
        if self.history_years == 0 {
            return Err(ForecastError::InvalidParameter(
                "history_years must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.leaf_order, ArimaOrder::new(1, 1, 0));
        assert_eq!(config.annual_order, ArimaOrder::new(3, 1, 2));
        assert_eq!(config.backtest_order, ArimaOrder::new(1, 1, 0));
        assert_eq!(config.holdout, 14);
        assert_eq!(config.horizon, 12);
        assert_eq!(config.history_years, 5);
        assert!(!config.fill_missing_months);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_lengths_are_rejected() {
        for config in [
            PipelineConfig::new().with_holdout(0),
            PipelineConfig::new().with_horizon(0),
            PipelineConfig::new().with_history_years(0),
        ] {
            assert!(matches!(
                config.validate(),
                Err(ForecastError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"holdout": 6, "layout": "injury"}"#).unwrap();
        assert_eq!(config.holdout, 6);
        assert_eq!(config.layout, TreeLayout::Injury);
        assert_eq!(config.horizon, DEFAULT_HORIZON);
    }
}
