//! Dimension layouts: which keys address a record in the count tree.

use serde::{Deserialize, Serialize};

use crate::core::{Record, Sex};

/// Intentionalities that never appear under a violence category.
pub const EXCLUDED_INTENTIONALITIES: [&str; 2] = ["ACCIDENTE", "AUTOINFLIGIDO"];

/// Attention types, in flag-field order. Flag `k` counts when it equals `ATTENTION_TYPES[k]`.
pub const ATTENTION_TYPES: [&str; 9] = [
    "MEDICA",
    "PSICOLOGICA",
    "QUIRURGICA",
    "PSIQUIATRICA",
    "CONSEJERIA",
    "OTRO",
    "PILDORA ANT EMERGENCIA",
    "PROFILAXIS VIH",
    "PROFILAXIS OTRAS ITS",
];

/// Violence categories, one per category marker field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Physical,
    Sexual,
    Psychological,
    Economic,
    Neglect,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Physical,
        Category::Sexual,
        Category::Psychological,
        Category::Economic,
        Category::Neglect,
    ];

    /// Tree key for the category.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Physical => "violencia fisica",
            Category::Sexual => "violencia sexual",
            Category::Psychological => "violencia psicologica",
            Category::Economic => "violencia economica",
            Category::Neglect => "Abandono/Negligencia",
        }
    }

    /// Canonical marker label expected in the category's field.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Physical => "VIOLENCIA FISICA",
            Category::Sexual => "VIOLENCIA SEXUAL",
            Category::Psychological => "VIOLENCIA PSICOLOGICA",
            Category::Economic => "VIOLENCIA ECONOMICA/PATRIMONIAL",
            Category::Neglect => "ABANDO/NEGLIGENCIA",
        }
    }

    /// Index of the marker field on [`Record::categories`].
    pub fn slot(&self) -> usize {
        *self as usize
    }

    /// Whether `record` belongs to this category.
    pub fn contains(&self, record: &Record) -> bool {
        record.categories[self.slot()].as_deref() == Some(self.label())
            && !EXCLUDED_INTENTIONALITIES.contains(&record.intentionality.as_str())
    }
}

/// Shape of a count tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeLayout {
    /// year -> location -> sex -> category -> intentionality, nine attention flags.
    #[default]
    Violence,
    /// year -> location -> sex -> intentionality, first five attention flags.
    Injury,
}

impl TreeLayout {
    /// Names of the branch levels, outermost first.
    pub fn dimensions(&self) -> &'static [&'static str] {
        match self {
            TreeLayout::Violence => &["year", "location", "sex", "category", "intentionality"],
            TreeLayout::Injury => &["year", "location", "sex", "intentionality"],
        }
    }

    /// Attention types counted in each leaf.
    pub fn attention_types(&self) -> &'static [&'static str] {
        match self {
            TreeLayout::Violence => &ATTENTION_TYPES,
            TreeLayout::Injury => &ATTENTION_TYPES[..5],
        }
    }

    /// Every key path `record` contributes to. A violence record may sit under several
    /// categories at once, or none.
    pub fn key_paths(&self, record: &Record, sex: Sex) -> Vec<Vec<String>> {
        let prefix = [
            record.year().to_string(),
            record.location.clone(),
            sex.label().to_string(),
        ];

        match self {
            TreeLayout::Violence => Category::ALL
                .iter()
                .filter(|category| category.contains(record))
                .map(|category| {
                    let mut path = prefix.to_vec();
                    path.push(category.key().to_string());
                    path.push(record.intentionality.clone());
                    path
                })
                .collect(),
            TreeLayout::Injury => {
                let mut path = prefix.to_vec();
                path.push(record.intentionality.clone());
                vec![path]
            }
        }
    }
}
