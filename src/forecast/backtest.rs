//! Holdout backtest of the per-stratum monthly forecast.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PipelineConfig;
use crate::core::{MonthlySeries, Record, Sex};
use crate::error::Result;
use crate::models::{FallbackPolicy, FallbackStats};
use crate::utils::{effectiveness, mape};

/// Effectiveness per stratum plus a pooled `overall` score.
///
/// Scores are percentages in `[0, 100]`; `None` means the stratum had too little
/// history to hold anything out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessReport {
    #[serde(flatten)]
    pub strata: BTreeMap<String, Option<f64>>,
    pub overall: Option<f64>,
    #[serde(skip)]
    pub stats: FallbackStats,
}

impl EffectivenessReport {
    /// Score of one stratum.
    pub fn stratum(&self, sex: Sex) -> Option<f64> {
        self.strata.get(sex.label()).copied().flatten()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Backtest each stratum, holding out the last `holdout` months.
pub fn evaluate(records: &[Record], holdout: usize) -> Result<EffectivenessReport> {
    evaluate_with(records, &PipelineConfig::default().with_holdout(holdout))
}

/// Backtest each stratum with the holdout, order and gap filling of `config`.
///
/// A stratum whose series has no more than `holdout` points scores `None`. The rest train
/// on everything before the holdout, forecast it, and score `100 - MAPE` clamped to
/// `[0, 100]`. `overall` scores every stratum's pairs pooled together.
pub fn evaluate_with(records: &[Record], config: &PipelineConfig) -> Result<EffectivenessReport> {
    config.validate()?;
    let policy = FallbackPolicy::new(config.backtest_order);
    let mut report = EffectivenessReport::default();
    let mut pooled_actual = Vec::new();
    let mut pooled_forecast = Vec::new();

    for sex in Sex::ALL {
        let mut series = MonthlySeries::for_stratum(records, sex);
        if config.fill_missing_months {
            series = series.fill_gaps();
        }

        let score = match series.split_tail(config.holdout) {
            None => {
                debug!(
                    stratum = %sex,
                    points = series.len(),
                    holdout = config.holdout,
                    "too short to backtest"
                );
                None
            }
            Some((train, test)) => {
                let resolved = policy.resolve(&train, test.len());
                report.stats.record(&resolved.outcome);
                let score = mape(&test, &resolved.values).ok().map(effectiveness);
                debug!(
                    stratum = %sex,
                    train = train.len(),
                    outcome = ?resolved.outcome,
                    ?score,
                    "backtest"
                );

                pooled_actual.extend_from_slice(&test);
                pooled_forecast.extend(resolved.values);
                score
            }
        };
        report.strata.insert(sex.label().to_string(), score);
    }

    report.overall = mape(&pooled_actual, &pooled_forecast).ok().map(effectiveness);
    Ok(report)
}
