//! Build count trees from records.

use std::collections::BTreeMap;

use tracing::debug;

use crate::aggregate::layout::TreeLayout;
use crate::aggregate::tree::{CountTree, LeafCounts};
use crate::core::Record;
use crate::error::Result;

/// Aggregate records into the violence tree.
///
/// See [`aggregate_with`].
pub fn aggregate(records: &[Record]) -> Result<CountTree> {
    aggregate_with(records, TreeLayout::Violence)
}

/// Aggregate records into a count tree of the given layout.
///
/// Records whose sex is not a known stratum are skipped. Any record with a blank
/// location or intentionality aborts the run with a structure error.
///
/// The result depends only on the multiset of records, not on their order.
pub fn aggregate_with(records: &[Record], layout: TreeLayout) -> Result<CountTree> {
    let attention_types = layout.attention_types();
    let mut groups: BTreeMap<Vec<String>, LeafCounts> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records {
        record.validate()?;
        let Some(sex) = record.stratum() else {
            skipped += 1;
            continue;
        };

        for path in layout.key_paths(record, sex) {
            let leaf = groups.entry(path).or_default();
            if let Some(agent) = &record.agent {
                *leaf.agents.entry(agent.clone()).or_insert(0) += 1;
            }
            if let Some(notified) = &record.notified {
                *leaf.notified.entry(notified.clone()).or_insert(0) += 1;
            }
            for (flag, expected) in record.attention.iter().zip(attention_types) {
                if flag.as_deref() == Some(*expected) {
                    *leaf.attention.entry(expected.to_string()).or_insert(0) += 1;
                }
            }
        }
    }

    let mut tree = CountTree::new();
    let groups_seen = groups.len();
    for (path, leaf) in groups {
        tree.insert_leaf(&path, leaf)?;
    }
    tree.prune();

    debug!(
        layout = ?layout,
        records = records.len(),
        skipped,
        groups = groups_seen,
        leaves = tree.leaf_count(),
        periods = tree.len(),
        "aggregated count tree"
    );

    Ok(tree)
}
