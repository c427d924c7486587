//! Core data structures: incident records and monthly series.

mod period;
mod record;
mod series;

pub use period::YearMonth;
pub use record::{Record, Sex, ATTENTION_FIELDS, CATEGORY_FIELDS};
pub use series::{monthly_totals, MonthlySeries, MonthlyTotal};
