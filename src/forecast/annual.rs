//! Monthly per-stratum forecast of the upcoming year.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PipelineConfig;
use crate::core::{MonthlySeries, Record, Sex, YearMonth};
use crate::error::Result;
use crate::models::{FallbackPolicy, FallbackStats};
use crate::utils::to_count;

/// One forecast month for one stratum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub year: i32,
    pub month: u32,
    pub stratum: Sex,
    /// Forecast record count, rounded to a non-negative integer.
    pub value: u64,
}

impl ForecastPoint {
    pub fn period(&self) -> YearMonth {
        YearMonth::new(self.year, self.month)
    }
}

/// Forecast points for every stratum, ordered by stratum then month.
///
/// Serializes as a plain JSON array of points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnualForecast {
    pub points: Vec<ForecastPoint>,
    #[serde(skip)]
    pub stats: FallbackStats,
}

impl AnnualForecast {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Points belonging to one stratum.
    pub fn stratum(&self, sex: Sex) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(move |p| p.stratum == sex)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Forecast January through December of `next_year` for each stratum.
pub fn forecast_year(records: &[Record], next_year: i32) -> Vec<ForecastPoint> {
    forecast_year_with(records, next_year, &PipelineConfig::default()).points
}

/// Forecast `config.horizon` months starting at January of `next_year`.
///
/// Each stratum's series keeps the `config.history_years` calendar years ending at its latest
/// year (all of them when fewer distinct years exist) and is resolved through the fallback policy with
/// `config.annual_order`. Strata without records produce no points. Steps are labelled
/// from January of `next_year` regardless of where the history ends.
pub fn forecast_year_with(
    records: &[Record],
    next_year: i32,
    config: &PipelineConfig,
) -> AnnualForecast {
    let policy = FallbackPolicy::new(config.annual_order);
    let mut forecast = AnnualForecast::default();

    for sex in Sex::ALL {
        let mut series =
            MonthlySeries::for_stratum(records, sex).recent_years(config.history_years);
        if series.is_empty() {
            debug!(stratum = %sex, "no records, skipping stratum");
            continue;
        }
        if config.fill_missing_months {
            series = series.fill_gaps();
        }

        let resolved = policy.resolve(&series.values(), config.horizon);
        forecast.stats.record(&resolved.outcome);

        debug!(
            stratum = %sex,
            points = series.len(),
            years = series.distinct_years().len(),
            outcome = ?resolved.outcome,
            "annual forecast"
        );

        let mut period = YearMonth::new(next_year, 1);
        for value in resolved.values {
            forecast.points.push(ForecastPoint {
                year: period.year,
                month: period.month,
                stratum: sex,
                value: to_count(value),
            });
            period = period.next();
        }
    }

    forecast
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn records_for(sex: &str, months: &[(i32, u32, usize)]) -> Vec<Record> {
        months
            .iter()
            .flat_map(|&(y, m, n)| {
                std::iter::repeat_with(move || {
                    Record::new(NaiveDate::from_ymd_opt(y, m, 1).unwrap(), "CENTRO", sex, "ASALTO")
                })
                .take(n)
            })
            .collect()
    }

    #[test]
    fn twelve_months_per_stratum() {
        let mut months = Vec::new();
        for year in 2019..=2023 {
            for month in 1..=12 {
                months.push((year, month, 3 + ((year as usize + month as usize) % 4)));
            }
        }
        let mut records = records_for("HOMBRE", &months);
        records.extend(records_for("MUJER", &months));

        let points = forecast_year(&records, 2024);
        assert_eq!(points.len(), 24);
        for sex in Sex::ALL {
            let months: Vec<u32> = points
                .iter()
                .filter(|p| p.stratum == sex)
                .map(|p| p.month)
                .collect();
            assert_eq!(months, (1..=12).collect::<Vec<_>>());
        }
        assert!(points.iter().all(|p| p.year == 2024));
    }

    #[test]
    fn empty_stratum_is_omitted() {
        let records = records_for("MUJER", &[(2023, 1, 2), (2023, 2, 4), (2023, 3, 3)]);
        let forecast = forecast_year_with(&records, 2024, &PipelineConfig::default());

        assert_eq!(forecast.len(), 12);
        assert_eq!(forecast.stratum(Sex::Male).count(), 0);
        assert_eq!(forecast.stats.total(), 1);
    }

    #[test]
    fn single_month_is_carried_across_the_year() {
        let records = records_for("HOMBRE", &[(2023, 5, 9)]);
        let forecast = forecast_year_with(&records, 2024, &PipelineConfig::default());

        assert!(forecast.points.iter().all(|p| p.value == 9));
        assert_eq!(forecast.stats.carried, 1);
    }

    #[test]
    fn constant_history_falls_back_to_zero() {
        let months: Vec<_> = (1..=12).map(|m| (2023, m, 4)).collect();
        let records = records_for("HOMBRE", &months);
        let forecast = forecast_year_with(&records, 2024, &PipelineConfig::default());

        assert_eq!(forecast.len(), 12);
        assert!(forecast.points.iter().all(|p| p.value == 0));
        assert_eq!(forecast.stats.fell_back, 1);
    }

    #[test]
    fn horizon_can_span_into_the_following_year() {
        let records = records_for("HOMBRE", &[(2023, 5, 9)]);
        let config = PipelineConfig::default().with_horizon(14);
        let forecast = forecast_year_with(&records, 2024, &config);

        let last = forecast.points.last().unwrap();
        assert_eq!(last.period(), YearMonth::new(2025, 2));
    }

    #[test]
    fn json_is_a_plain_array() {
        let forecast = AnnualForecast {
            points: vec![ForecastPoint {
                year: 2025,
                month: 1,
                stratum: Sex::Female,
                value: 12,
            }],
            stats: FallbackStats::default(),
        };
        let json = forecast.to_json().unwrap();
        assert_eq!(
            json,
            r#"[{"year":2025,"month":1,"stratum":"MUJER","value":12}]"#
        );
        assert_eq!(AnnualForecast::from_json(&json).unwrap(), forecast);
    }
}
