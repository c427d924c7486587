//! End-to-end run: aggregate, forecast, and backtest one snapshot of records.

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::{aggregate_with, CountTree};
use crate::config::PipelineConfig;
use crate::core::{monthly_totals, MonthlyTotal, Record};
use crate::error::Result;
use crate::forecast::{
    evaluate_with, forecast_tree_with, forecast_year_with, AnnualForecast, EffectivenessReport,
    TreeForecast,
};
use crate::models::{FallbackPolicy, FallbackStats};

/// Every artifact produced by one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// Historical counts per year.
    pub counts: CountTree,
    /// Record counts per month and stratum.
    pub monthly: Vec<MonthlyTotal>,
    /// Forecast counts for the target year.
    pub forecast: TreeForecast,
    /// Monthly per-stratum forecast for the target year.
    pub annual: AnnualForecast,
    /// Backtest scores.
    pub effectiveness: EffectivenessReport,
}

impl PipelineOutput {
    /// Fallback counts across every forecast in the run.
    pub fn fallback_stats(&self) -> FallbackStats {
        let mut stats = self.forecast.stats;
        stats.merge(&self.annual.stats);
        stats.merge(&self.effectiveness.stats);
        stats
    }
}

/// Runs the full aggregation and forecasting sequence.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run against the year after the current local year.
    pub fn run_next_year(&self, records: &[Record]) -> Result<PipelineOutput> {
        self.run(records, Local::now().year() + 1)
    }

    /// Run all stages for `target_year`.
    ///
    /// Fails only on invalid configuration or malformed records; numerical failures in
    /// individual series fall back and are counted in the output.
    pub fn run(&self, records: &[Record], target_year: i32) -> Result<PipelineOutput> {
        self.config.validate()?;
        info!(
            records = records.len(),
            target_year,
            layout = ?self.config.layout,
            "starting run"
        );

        let counts = aggregate_with(records, self.config.layout)?;
        info!(
            periods = counts.len(),
            leaves = counts.leaf_count(),
            "aggregated counts"
        );

        let monthly = monthly_totals(records);
        info!(rows = monthly.len(), "grouped monthly totals");

        let policy = FallbackPolicy::new(self.config.leaf_order);
        let forecast = forecast_tree_with(&counts, &target_year.to_string(), &policy)?;
        info!(
            leaves = forecast.root.leaf_count(),
            modelled = forecast.stats.modelled,
            fell_back = forecast.stats.fell_back,
            "forecast count tree"
        );

        let annual = forecast_year_with(records, target_year, &self.config);
        info!(points = annual.len(), "forecast monthly strata");

        let effectiveness = evaluate_with(records, &self.config)?;
        info!(overall = ?effectiveness.overall, "backtest complete");

        Ok(PipelineOutput {
            counts,
            monthly,
            forecast,
            annual,
            effectiveness,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Node;
    use crate::error::ForecastError;
    use chrono::NaiveDate;

    #[test]
    fn empty_input_yields_empty_artifacts() {
        let output = Pipeline::default().run(&[], 2025).unwrap();
        assert!(output.counts.is_empty());
        assert!(output.monthly.is_empty());
        assert_eq!(output.forecast.root, Node::branch());
        assert!(output.annual.is_empty());
        assert!(output.effectiveness.strata.values().all(Option::is_none));
        assert_eq!(output.effectiveness.overall, None);
        assert_eq!(output.fallback_stats().total(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let pipeline = Pipeline::new(PipelineConfig::default().with_horizon(0));
        assert!(matches!(
            pipeline.run(&[], 2025),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn forecast_period_is_target_year() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let records = vec![Record::new(date, "CENTRO", "MUJER", "VIOLENCIA FAMILIAR")
            .with_category(0, "VIOLENCIA FISICA")
            .with_agent("GOLPE")];

        let output = Pipeline::default().run(&records, 2025).unwrap();
        assert_eq!(output.forecast.period, "2025");
        assert_eq!(output.annual.len(), 12);
        assert!(output.forecast.root.get(&["CENTRO", "MUJER"]).is_some());
        assert_eq!(
            output.monthly,
            vec![MonthlyTotal {
                year: 2024,
                month: 3,
                stratum: crate::core::Sex::Female,
                total: 1,
            }]
        );
    }
}
