//! Recursive count tree.
//!
//! A tree maps period labels to nested branches keyed by dimension value, ending in
//! [`LeafCounts`]. The same shape carries both historical counts and forecasts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Counts held at the bottom of a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeafCounts {
    /// Records per distinct injury agent.
    #[serde(alias = "agentes")]
    pub agents: BTreeMap<String, u64>,
    /// Records per distinct notification value.
    #[serde(alias = "Notificado al MP")]
    pub notified: BTreeMap<String, u64>,
    /// Records per attention type.
    #[serde(alias = "Tipo de atención")]
    pub attention: BTreeMap<String, u64>,
}

impl LeafCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty() && self.notified.is_empty() && self.attention.is_empty()
    }

    /// Slots by name, in output order.
    pub fn slots(&self) -> [(&'static str, &BTreeMap<String, u64>); 3] {
        [
            ("agents", &self.agents),
            ("notified", &self.notified),
            ("attention", &self.attention),
        ]
    }

    pub fn slots_mut(&mut self) -> [(&'static str, &mut BTreeMap<String, u64>); 3] {
        [
            ("agents", &mut self.agents),
            ("notified", &mut self.notified),
            ("attention", &mut self.attention),
        ]
    }

    /// Drop zero-valued entries.
    pub fn prune(&mut self) {
        for (_, slot) in self.slots_mut() {
            slot.retain(|_, count| *count > 0);
        }
    }

    /// Sum of every count in every slot.
    pub fn total(&self) -> u64 {
        self.slots()
            .iter()
            .map(|(_, slot)| slot.values().sum::<u64>())
            .sum()
    }
}

/// A node of a count or forecast tree.
///
/// Serialized untagged: a leaf is an object with exactly the three slot keys, a branch is
/// any other object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Leaf(LeafCounts),
    Branch(BTreeMap<String, Node>),
}

impl Node {
    /// An empty branch.
    pub fn branch() -> Self {
        Node::Branch(BTreeMap::new())
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Look up a descendant by key path.
    pub fn get(&self, path: &[&str]) -> Option<&Node> {
        match path {
            [] => Some(self),
            [head, rest @ ..] => match self {
                Node::Branch(children) => children.get(*head)?.get(rest),
                Node::Leaf(_) => None,
            },
        }
    }

    /// Number of leaves below this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Branch(children) => children.values().map(Node::leaf_count).sum(),
        }
    }

    /// Remove zero counts, then every leaf and branch left with nothing in it.
    ///
    /// Returns `true` when the node itself is now empty.
    pub fn prune(&mut self) -> bool {
        match self {
            Node::Leaf(counts) => {
                counts.prune();
                counts.is_empty()
            }
            Node::Branch(children) => {
                children.retain(|_, child| !child.prune());
                children.is_empty()
            }
        }
    }

    /// Check that no zero count and no empty node is present.
    pub fn check_pruned(&self, path: &mut Vec<String>) -> Result<()> {
        match self {
            Node::Leaf(counts) => {
                for (slot, entries) in counts.slots() {
                    if let Some((key, _)) = entries.iter().find(|(_, count)| **count == 0) {
                        return Err(ForecastError::Structure(format!(
                            "zero count for {key:?} in {slot} at {}",
                            path.join(" / ")
                        )));
                    }
                }
                if counts.is_empty() {
                    return Err(ForecastError::Structure(format!(
                        "empty leaf at {}",
                        path.join(" / ")
                    )));
                }
            }
            Node::Branch(children) => {
                if children.is_empty() {
                    return Err(ForecastError::Structure(format!(
                        "empty branch at {}",
                        path.join(" / ")
                    )));
                }
                for (key, child) in children {
                    path.push(key.clone());
                    child.check_pruned(path)?;
                    path.pop();
                }
            }
        }
        Ok(())
    }

    /// Insert `leaf` under `path`, creating branches as needed.
    pub(crate) fn insert_leaf(&mut self, path: &[String], leaf: LeafCounts) -> Result<()> {
        let Node::Branch(children) = self else {
            return Err(ForecastError::Structure(
                "cannot insert below a leaf".to_string(),
            ));
        };
        insert_into(children, path, leaf)
    }
}

fn insert_into(
    children: &mut BTreeMap<String, Node>,
    path: &[String],
    leaf: LeafCounts,
) -> Result<()> {
    match path {
        [] => Err(ForecastError::Structure("empty key path".to_string())),
        [last] => {
            if children.insert(last.clone(), Node::Leaf(leaf)).is_some() {
                return Err(ForecastError::Structure(format!(
                    "duplicate leaf for key {last:?}"
                )));
            }
            Ok(())
        }
        [head, rest @ ..] => children
            .entry(head.clone())
            .or_insert_with(Node::branch)
            .insert_leaf(rest, leaf),
    }
}

/// Period label -> per-period tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountTree {
    periods: BTreeMap<String, Node>,
}

impl CountTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// The tree for one period.
    pub fn period(&self, label: &str) -> Option<&Node> {
        self.periods.get(label)
    }

    /// Look up a node by full key path, period first.
    pub fn get(&self, path: &[&str]) -> Option<&Node> {
        let (period, rest) = path.split_first()?;
        self.periods.get(*period)?.get(rest)
    }

    /// Period labels in chronological order.
    ///
    /// Integer labels compare numerically and sort before any other label; the rest sort
    /// lexicographically.
    pub fn period_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.periods.keys().map(String::as_str).collect();
        labels.sort_by(|a, b| match (a.parse::<i64>(), b.parse::<i64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        });
        labels
    }

    /// Per-period trees in chronological order.
    pub fn iter_chronological(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.period_labels()
            .into_iter()
            .filter_map(move |label| self.periods.get(label).map(|node| (label, node)))
    }

    /// Add a period. Fails if the label is already present.
    pub fn insert_period(&mut self, label: impl Into<String>, node: Node) -> Result<()> {
        let label = label.into();
        if self.periods.contains_key(&label) {
            return Err(ForecastError::Structure(format!(
                "period {label:?} is already present"
            )));
        }
        self.periods.insert(label, node);
        Ok(())
    }

    /// Stack the periods of `other` onto this tree.
    pub fn extend(&mut self, other: CountTree) -> Result<()> {
        for (label, node) in other.periods {
            self.insert_period(label, node)?;
        }
        Ok(())
    }

    pub(crate) fn insert_leaf(&mut self, path: &[String], leaf: LeafCounts) -> Result<()> {
        match path.split_first() {
            Some((period, rest)) => self
                .periods
                .entry(period.clone())
                .or_insert_with(Node::branch)
                .insert_leaf(rest, leaf),
            None => Err(ForecastError::Structure("empty key path".to_string())),
        }
    }

    /// Remove empty nodes throughout.
    pub fn prune(&mut self) {
        self.periods.retain(|_, node| !node.prune());
    }

    /// Check the pruning invariant on every period.
    pub fn validate(&self) -> Result<()> {
        for (label, node) in &self.periods {
            let mut path = vec![label.clone()];
            node.check_pruned(&mut path)?;
        }
        Ok(())
    }

    /// Total number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.periods.values().map(Node::leaf_count).sum()
    }

    /// Serialize to compact JSON with sorted keys.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a count tree and check it holds no empty nodes.
    pub fn from_json(json: &str) -> Result<Self> {
        let tree: CountTree = serde_json::from_str(json)?;
        tree.validate()?;
        Ok(tree)
    }
}

impl FromIterator<(String, Node)> for CountTree {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        Self {
            periods: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(agents: &[(&str, u64)]) -> LeafCounts {
        LeafCounts {
            agents: agents.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..Default::default()
        }
    }

    fn path(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn leaf_json_uses_three_named_slots() {
        let mut counts = leaf(&[("ARMA BLANCA", 2)]);
        counts.attention.insert("MEDICA".to_string(), 1);
        let json = serde_json::to_string(&Node::Leaf(counts)).unwrap();
        assert_eq!(
            json,
            r#"{"agents":{"ARMA BLANCA":2},"notified":{},"attention":{"MEDICA":1}}"#
        );
    }

    #[test]
    fn leaf_and_branch_are_told_apart_on_input() {
        let json = r#"{"CENTRO":{"agents":{"X":1},"notified":{},"attention":{}}}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        let Node::Branch(children) = &node else {
            panic!("expected a branch");
        };
        assert!(children["CENTRO"].is_leaf());
    }

    #[test]
    fn legacy_slot_names_are_accepted() {
        let json = r#"{"agentes":{"X":3},"Notificado al MP":{"SI":1},"Tipo de atención":{}}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        match node {
            Node::Leaf(counts) => {
                assert_eq!(counts.agents["X"], 3);
                assert_eq!(counts.notified["SI"], 1);
            }
            Node::Branch(_) => panic!("expected a leaf"),
        }
    }

    #[test]
    fn insert_builds_branches_and_rejects_conflicts() {
        let mut tree = CountTree::new();
        tree.insert_leaf(&path(&["2023", "CENTRO", "ASALTO"]), leaf(&[("X", 1)]))
            .unwrap();
        tree.insert_leaf(&path(&["2023", "CENTRO", "RIÑA"]), leaf(&[("Y", 2)]))
            .unwrap();

        assert_eq!(tree.leaf_count(), 2);
        assert!(tree.get(&["2023", "CENTRO", "RIÑA"]).unwrap().is_leaf());

        let below_leaf = tree.insert_leaf(&path(&["2023", "CENTRO", "ASALTO", "X"]), leaf(&[]));
        assert!(matches!(below_leaf, Err(ForecastError::Structure(_))));

        let duplicate = tree.insert_leaf(&path(&["2023", "CENTRO", "ASALTO"]), leaf(&[]));
        assert!(matches!(duplicate, Err(ForecastError::Structure(_))));
    }

    #[test]
    fn prune_removes_zero_counts_and_empty_nodes() {
        let mut tree = CountTree::new();
        tree.insert_leaf(&path(&["2023", "A", "X"]), leaf(&[("k", 0)]))
            .unwrap();
        tree.insert_leaf(&path(&["2023", "B", "X"]), leaf(&[("k", 2), ("z", 0)]))
            .unwrap();
        tree.insert_leaf(&path(&["2024", "A", "X"]), leaf(&[])).unwrap();

        assert!(tree.validate().is_err());
        tree.prune();
        assert!(tree.validate().is_ok());

        assert_eq!(tree.period_labels(), vec!["2023"]);
        assert!(tree.get(&["2023", "A"]).is_none());
        match tree.get(&["2023", "B", "X"]) {
            Some(Node::Leaf(counts)) => assert_eq!(counts.total(), 2),
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn period_labels_sort_numerically() {
        let tree: CountTree = ["999", "2023", "1000", "Q1"]
            .iter()
            .map(|label| (label.to_string(), Node::branch()))
            .collect();
        assert_eq!(tree.period_labels(), vec!["999", "1000", "2023", "Q1"]);
    }

    #[test]
    fn json_round_trip_and_validation() {
        let mut tree = CountTree::new();
        tree.insert_leaf(&path(&["2022", "CENTRO", "ASALTO"]), leaf(&[("X", 4)]))
            .unwrap();

        let json = tree.to_json().unwrap();
        assert_eq!(CountTree::from_json(&json).unwrap(), tree);

        let with_empty = r#"{"2022":{"CENTRO":{}}}"#;
        assert!(matches!(
            CountTree::from_json(with_empty),
            Err(ForecastError::Structure(_))
        ));

        assert!(matches!(
            CountTree::from_json("[1,2]"),
            Err(ForecastError::Serialization(_))
        ));
    }

    #[test]
    fn extend_rejects_duplicate_periods() {
        let mut a: CountTree = vec![("2022".to_string(), Node::branch())].into_iter().collect();
        let b: CountTree = vec![("2022".to_string(), Node::branch())].into_iter().collect();
        assert!(a.extend(b).is_err());
        assert_eq!(a.len(), 1);
    }
}
