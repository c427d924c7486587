//! One-step-ahead forecast of every count in a multi-period tree.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{CountTree, LeafCounts, Node};
use crate::config::LEAF_ORDER;
use crate::error::{ForecastError, Result};
use crate::models::{FallbackPolicy, FallbackStats};
use crate::utils::to_count;

/// A forecast tree for one upcoming period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeForecast {
    /// Label of the forecast period.
    pub period: String,
    /// Forecast counts, shaped like the union of the input periods.
    pub root: Node,
    /// How many leaf entries took each fallback rung.
    #[serde(skip)]
    pub stats: FallbackStats,
}

impl TreeForecast {
    /// Look up a forecast node below the period.
    pub fn get(&self, path: &[&str]) -> Option<&Node> {
        self.root.get(path)
    }

    /// The forecast as a one-period tree, `{period: root}`.
    pub fn into_tree(self) -> CountTree {
        std::iter::once((self.period, self.root)).collect()
    }

    /// Serialize as `{period: root}`.
    pub fn to_json(&self) -> Result<String> {
        let wrapped: BTreeMap<&str, &Node> =
            std::iter::once((self.period.as_str(), &self.root)).collect();
        Ok(serde_json::to_string(&wrapped)?)
    }
}

/// Forecast the next period of every series in `tree` with the leaf order.
pub fn forecast_tree(tree: &CountTree, next_period: &str) -> Result<TreeForecast> {
    forecast_tree_with(tree, next_period, &FallbackPolicy::new(LEAF_ORDER))
}

/// Forecast the next period of every series in `tree`.
///
/// Keys are unioned across periods at every level. Each leaf entry's history holds one
/// value per period, zero where the entry (or any ancestor) is absent, and is resolved
/// through `policy`. A position that is a branch in one period and a leaf in another is
/// a structure error.
pub fn forecast_tree_with(
    tree: &CountTree,
    next_period: &str,
    policy: &FallbackPolicy,
) -> Result<TreeForecast> {
    let periods: Vec<&Node> = tree.iter_chronological().map(|(_, node)| node).collect();
    let aligned: Vec<Option<&Node>> = periods.into_iter().map(Some).collect();

    let mut stats = FallbackStats::default();
    let mut path = Vec::new();
    let root = if aligned.is_empty() {
        Node::branch()
    } else {
        forecast_node(&aligned, policy, &mut stats, &mut path)?
    };

    debug!(
        period = next_period,
        periods = tree.len(),
        leaves = root.leaf_count(),
        modelled = stats.modelled,
        carried = stats.carried,
        fell_back = stats.fell_back,
        "forecast count tree"
    );

    Ok(TreeForecast {
        period: next_period.to_string(),
        root,
        stats,
    })
}

/// Forecast one position given its node in each period, `None` where absent.
fn forecast_node(
    history: &[Option<&Node>],
    policy: &FallbackPolicy,
    stats: &mut FallbackStats,
    path: &mut Vec<String>,
) -> Result<Node> {
    let present = history.iter().flatten();
    let leaves = present.clone().filter(|node| node.is_leaf()).count();
    let branches = present.count() - leaves;

    if leaves > 0 && branches > 0 {
        return Err(ForecastError::Structure(format!(
            "{} is a leaf in {leaves} period(s) and a branch in {branches}",
            describe(path)
        )));
    }

    if leaves > 0 {
        let counts: Vec<Option<&LeafCounts>> = history
            .iter()
            .map(|node| match node {
                Some(Node::Leaf(counts)) => Some(counts),
                _ => None,
            })
            .collect();
        return Ok(Node::Leaf(forecast_leaf(&counts, policy, stats)));
    }

    let children: Vec<Option<&BTreeMap<String, Node>>> = history
        .iter()
        .map(|node| match node {
            Some(Node::Branch(children)) => Some(children),
            _ => None,
        })
        .collect();

    let keys: BTreeSet<&String> = children
        .iter()
        .flatten()
        .copied()
        .flat_map(BTreeMap::keys)
        .collect();

    let mut forecast = BTreeMap::new();
    for key in keys {
        let child_history: Vec<Option<&Node>> = children
            .iter()
            .map(|c| c.and_then(|c| c.get(key)))
            .collect();
        path.push(key.clone());
        let child = forecast_node(&child_history, policy, stats, path)?;
        path.pop();
        forecast.insert(key.clone(), child);
    }

    Ok(Node::Branch(forecast))
}

fn forecast_leaf(
    history: &[Option<&LeafCounts>],
    policy: &FallbackPolicy,
    stats: &mut FallbackStats,
) -> LeafCounts {
    let mut forecast = LeafCounts::new();
    for (slot, out) in forecast.slots_mut() {
        let slot_history: Vec<Option<&BTreeMap<String, u64>>> = history
            .iter()
            .map(|counts| counts.and_then(|c| slot_of(c, slot)))
            .collect();

        let keys: BTreeSet<&String> = slot_history
            .iter()
            .flatten()
            .copied()
            .flat_map(BTreeMap::keys)
            .collect();

        for key in keys {
            let series: Vec<f64> = slot_history
                .iter()
                .map(|m| m.and_then(|m| m.get(key)).map_or(0.0, |&v| v as f64))
                .collect();
            let next = policy.resolve_next(&series);
            stats.record(&next.outcome);
            let value = next.values.first().copied().unwrap_or(0.0);
            out.insert(key.clone(), to_count(value));
        }
    }
    forecast
}

fn slot_of<'a>(counts: &'a LeafCounts, name: &str) -> Option<&'a BTreeMap<String, u64>> {
    counts
        .slots()
        .into_iter()
        .find(|(slot, _)| *slot == name)
        .map(|(_, map)| map)
}

fn describe(path: &[String]) -> String {
    if path.is_empty() {
        "the period root".to_string()
    } else {
        path.join(" / ")
    }
}
