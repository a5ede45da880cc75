//! Flat per-node aggregates for the sunburst chart
//!
//! One [`RollupEntry`] per group and per tensor, parents before children,
//! siblings in natural order. The synthetic root is not listed; entries
//! directly under it have an empty `parent_path`.

use crate::tree::{GroupNode, Node, TensorTree};

/// Aggregate for one node of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupEntry {
    /// Full dotted path (unique among entries of the same kind)
    pub path: String,
    /// Path of the parent group, empty for top-level nodes
    pub parent_path: String,
    /// Last segment
    pub name: String,
    /// Payload bytes in the subtree
    pub total_bytes: u64,
    /// Tensors in the subtree (1 for a tensor)
    pub tensor_count: u64,
    /// True for tensors, false for groups
    pub is_tensor: bool,
}

/// Collect aggregates for every node, depth-first
#[must_use]
pub fn rollup(tree: &TensorTree) -> Vec<RollupEntry> {
    let mut entries = Vec::with_capacity(usize::try_from(tree.tensor_count()).unwrap_or(0));
    collect(tree.root(), &mut entries);
    entries
}

fn collect(group: &GroupNode, out: &mut Vec<RollupEntry>) {
    for child in group.children() {
        out.push(RollupEntry {
            path: child.path().to_string(),
            parent_path: group.path().to_string(),
            name: child.name().to_string(),
            total_bytes: child.total_bytes(),
            tensor_count: child.tensor_count(),
            is_tensor: !child.is_group(),
        });
        if let Node::Group(g) = child {
            collect(g, out);
        }
    }
}
