//! Hierarchical aggregation of records into count trees.

mod builder;
mod layout;
mod tree;

pub use builder::{aggregate, aggregate_with};
pub use layout::{Category, TreeLayout, ATTENTION_TYPES, EXCLUDED_INTENTIONALITIES};
pub use tree::{CountTree, LeafCounts, Node};
