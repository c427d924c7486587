//! Incident records as handed over by the extraction layer.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::period::YearMonth;
use crate::error::{ForecastError, Result};

/// Number of category marker fields on a record.
pub const CATEGORY_FIELDS: usize = 5;

/// Number of attention-type flag fields on a record.
pub const ATTENTION_FIELDS: usize = 9;

/// Sex of the person attended; the strata of the flat forecasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "HOMBRE")]
    Male,
    #[serde(rename = "MUJER")]
    Female,
}

impl Sex {
    /// Every stratum, in output order.
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// Label used as a tree key and in serialized output.
    pub fn label(&self) -> &'static str {
        match self {
            Sex::Male => "HOMBRE",
            Sex::Female => "MUJER",
        }
    }

    /// Parse a normalized label. Unknown values are not a stratum.
    pub fn from_label(label: &str) -> Option<Sex> {
        match label {
            "HOMBRE" | "M" => Some(Sex::Male),
            "MUJER" | "F" => Some(Sex::Female),
            _ => None,
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One attended event.
///
/// Categorical text is expected to be trimmed and upper-cased already.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Date the event was attended.
    pub date: NaiveDate,
    /// Municipality where the event occurred.
    pub location: String,
    /// Raw sex label; see [`Sex::from_label`].
    pub sex: String,
    /// Intentionality (the sub-category).
    pub intentionality: String,
    /// Category marker fields; slot `k` holds the label for category `k` when it applies.
    #[serde(default)]
    pub categories: [Option<String>; CATEGORY_FIELDS],
    /// Agent that caused the injury.
    #[serde(default)]
    pub agent: Option<String>,
    /// Whether / how the public prosecutor was notified.
    #[serde(default)]
    pub notified: Option<String>,
    /// Attention-type flag fields; slot `k` holds the label of attention type `k` when given.
    #[serde(default)]
    pub attention: [Option<String>; ATTENTION_FIELDS],
}

impl Record {
    /// Create a record with no category, outcome or attention fields set.
    pub fn new(
        date: NaiveDate,
        location: impl Into<String>,
        sex: impl Into<String>,
        intentionality: impl Into<String>,
    ) -> Self {
        Self {
            date,
            location: location.into(),
            sex: sex.into(),
            intentionality: intentionality.into(),
            categories: Default::default(),
            agent: None,
            notified: None,
            attention: Default::default(),
        }
    }

    /// Set category marker field `slot`.
    pub fn with_category(mut self, slot: usize, label: impl Into<String>) -> Self {
        if let Some(field) = self.categories.get_mut(slot) {
            *field = Some(label.into());
        }
        self
    }

    /// Set the injury agent.
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Set the notification value.
    pub fn with_notified(mut self, notified: impl Into<String>) -> Self {
        self.notified = Some(notified.into());
        self
    }

    /// Set attention-type flag field `slot`.
    pub fn with_attention(mut self, slot: usize, label: impl Into<String>) -> Self {
        if let Some(field) = self.attention.get_mut(slot) {
            *field = Some(label.into());
        }
        self
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }

    /// The stratum this record belongs to, if its sex label is recognised.
    pub fn stratum(&self) -> Option<Sex> {
        Sex::from_label(&self.sex)
    }

    /// Reject records whose dimension values cannot address a tree node.
    pub fn validate(&self) -> Result<()> {
        if self.location.trim().is_empty() {
            return Err(ForecastError::Structure(format!(
                "record dated {} has a blank location",
                self.date
            )));
        }
        if self.intentionality.trim().is_empty() {
            return Err(ForecastError::Structure(format!(
                "record dated {} in {} has a blank intentionality",
                self.date, self.location
            )));
        }
        Ok(())
    }
}
