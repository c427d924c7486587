//! Monthly count series, one per stratum.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::period::YearMonth;
use crate::core::record::{Record, Sex};

/// Ordered `(year, month) -> value` series.
///
/// Keyed by a `BTreeMap`, so periods are strictly increasing and never duplicated.
/// Months without observations are absent unless [`fill_gaps`](Self::fill_gaps) is used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlySeries {
    points: BTreeMap<YearMonth, f64>,
}

impl MonthlySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series counting one per period occurrence.
    pub fn from_periods<I>(periods: I) -> Self
    where
        I: IntoIterator<Item = YearMonth>,
    {
        let mut points = BTreeMap::new();
        for period in periods {
            *points.entry(period).or_insert(0.0) += 1.0;
        }
        Self { points }
    }

    /// Record counts per month for one stratum.
    pub fn for_stratum(records: &[Record], sex: Sex) -> Self {
        Self::from_periods(
            records
                .iter()
                .filter(|r| r.stratum() == Some(sex))
                .map(Record::year_month),
        )
    }

    /// Set the value of a period, replacing any previous value.
    pub fn insert(&mut self, period: YearMonth, value: f64) {
        self.points.insert(period, value);
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, period: YearMonth) -> Option<f64> {
        self.points.get(&period).copied()
    }

    /// Periods in chronological order.
    pub fn periods(&self) -> Vec<YearMonth> {
        self.points.keys().copied().collect()
    }

    /// Values in chronological order.
    pub fn values(&self) -> Vec<f64> {
        self.points.values().copied().collect()
    }

    pub fn last_period(&self) -> Option<YearMonth> {
        self.points.keys().next_back().copied()
    }

    /// Distinct calendar years present, ascending.
    pub fn distinct_years(&self) -> Vec<i32> {
        self.points
            .keys()
            .map(|p| p.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Keep the calendar window of `years` years ending at the latest observed year.
    ///
    /// The window spans calendar years, so missing years inside it are not replaced by
    /// older ones. With fewer than `years` distinct years present, everything is kept.
    pub fn recent_years(&self, years: usize) -> MonthlySeries {
        let distinct = self.distinct_years();
        let Some(&latest) = distinct.last() else {
            return self.clone();
        };
        if distinct.len() < years {
            return self.clone();
        }
        let span = i32::try_from(years.saturating_sub(1)).unwrap_or(i32::MAX);
        let first = latest.saturating_sub(span);
        Self {
            points: self
                .points
                .iter()
                .filter(|(p, _)| p.year >= first)
                .map(|(p, v)| (*p, *v))
                .collect(),
        }
    }

    /// Insert zero for every month missing between the first and last observation.
    pub fn fill_gaps(&self) -> MonthlySeries {
        let mut filled = self.clone();
        if let (Some(&first), Some(last)) = (self.points.keys().next(), self.last_period()) {
            let mut current = first;
            while current < last {
                filled.points.entry(current).or_insert(0.0);
                current = current.next();
            }
        }
        filled
    }

    /// Split the values into `(train, test)` where `test` holds the last `holdout` points.
    ///
    /// Returns `None` unless at least one point remains for training.
    pub fn split_tail(&self, holdout: usize) -> Option<(Vec<f64>, Vec<f64>)> {
        if self.len() <= holdout {
            return None;
        }
        let values = self.values();
        let (train, test) = values.split_at(values.len() - holdout);
        Some((train.to_vec(), test.to_vec()))
    }
}

/// One row of the grouped monthly counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    pub stratum: Sex,
    pub total: u64,
}

/// Record counts per month and stratum, ordered by period and then stratum.
///
/// Records outside the known strata are skipped. Months without records produce no row.
pub fn monthly_totals(records: &[Record]) -> Vec<MonthlyTotal> {
    let mut totals: BTreeMap<(YearMonth, Sex), u64> = BTreeMap::new();
    for record in records {
        if let Some(sex) = record.stratum() {
            *totals.entry((record.year_month(), sex)).or_insert(0) += 1;
        }
    }
    totals
        .into_iter()
        .map(|((period, stratum), total)| MonthlyTotal {
            year: period.year,
            month: period.month,
            stratum,
            total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(y: i32, m: u32, sex: &str) -> Record {
        Record::new(NaiveDate::from_ymd_opt(y, m, 10).unwrap(), "CENTRO", sex, "ASALTO")
    }

    #[test]
    fn counts_records_per_month_and_stratum() {
        let mut records = vec![record(2023, 1, "HOMBRE"); 5];
        records.extend(vec![record(2023, 2, "HOMBRE"); 3]);
        records.push(record(2023, 1, "MUJER"));
        records.push(record(2023, 1, "DESCONOCIDO"));

        let male = MonthlySeries::for_stratum(&records, Sex::Male);
        assert_eq!(male.values(), vec![5.0, 3.0]);
        assert_eq!(male.get(YearMonth::new(2023, 1)), Some(5.0));

        let female = MonthlySeries::for_stratum(&records, Sex::Female);
        assert_eq!(female.len(), 1);
    }

    #[test]
    fn monthly_totals_group_by_period_and_stratum() {
        let mut records = vec![record(2023, 2, "MUJER"); 2];
        records.extend(vec![record(2023, 1, "HOMBRE"); 5]);
        records.push(record(2023, 1, "MUJER"));
        records.push(record(2023, 1, "DESCONOCIDO"));

        let totals = monthly_totals(&records);
        let rows: Vec<_> = totals
            .iter()
            .map(|t| (t.year, t.month, t.stratum, t.total))
            .collect();
        assert_eq!(
            rows,
            vec![
                (2023, 1, Sex::Male, 5),
                (2023, 1, Sex::Female, 1),
                (2023, 2, Sex::Female, 2),
            ]
        );

        let json = serde_json::to_string(&totals[0]).unwrap();
        assert_eq!(json, r#"{"year":2023,"month":1,"stratum":"HOMBRE","total":5}"#);

        let male = MonthlySeries::for_stratum(&records, Sex::Male);
        let male_total: u64 = totals
            .iter()
            .filter(|t| t.stratum == Sex::Male)
            .map(|t| t.total)
            .sum();
        assert_eq!(male_total as f64, male.values().iter().sum::<f64>());
    }

    #[test]
    fn periods_are_strictly_increasing() {
        let series = MonthlySeries::from_periods(vec![
            YearMonth::new(2023, 3),
            YearMonth::new(2021, 7),
            YearMonth::new(2023, 3),
            YearMonth::new(2022, 1),
        ]);
        let periods = series.periods();
        assert!(periods.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(series.get(YearMonth::new(2023, 3)), Some(2.0));
    }

    #[test]
    fn recent_years_keeps_last_calendar_years() {
        let periods = [2015, 2017, 2018, 2019, 2020, 2021, 2022]
            .iter()
            .map(|&y| YearMonth::new(y, 6));
        let series = MonthlySeries::from_periods(periods);

        let recent = series.recent_years(5);
        assert_eq!(recent.distinct_years(), vec![2018, 2019, 2020, 2021, 2022]);

        let all = series.recent_years(10);
        assert_eq!(all.len(), series.len());
    }

    #[test]
    fn recent_years_is_a_calendar_window() {
        // Every other year from 2010 to 2020
        let periods = (2010..=2020)
            .step_by(2)
            .flat_map(|y| [YearMonth::new(y, 1), YearMonth::new(y, 12)]);
        let series = MonthlySeries::from_periods(periods);

        let recent = series.recent_years(5);
        assert_eq!(recent.distinct_years(), vec![2016, 2018, 2020]);
        assert_eq!(recent.len(), 6);
        assert_eq!(recent.periods()[0], YearMonth::new(2016, 1));

        // Six distinct years never fill a seven year window
        let short = series.recent_years(7);
        assert_eq!(short.distinct_years(), series.distinct_years());
    }

    #[test]
    fn fill_gaps_inserts_zero_months() {
        let mut series = MonthlySeries::new();
        series.insert(YearMonth::new(2022, 11), 4.0);
        series.insert(YearMonth::new(2023, 2), 6.0);

        let filled = series.fill_gaps();
        assert_eq!(filled.values(), vec![4.0, 0.0, 0.0, 6.0]);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn split_tail_requires_training_data() {
        let series = MonthlySeries::from_periods(YearMonth::months_of(2023));
        assert!(series.split_tail(12).is_none());

        let (train, test) = series.split_tail(4).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 4);
    }
}
