//! Visible-row flattening
//!
//! Turns the tree plus the set of expanded group paths into the ordered list
//! of rows the renderer draws and the cursor indexes into. The synthetic
//! root is never emitted; its children sit at depth 0.

use std::collections::HashSet;

use crate::tree::{GroupNode, Node, NodeId};

/// One rendered line of the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRow<'t> {
    /// Node shown on this row
    pub node: &'t Node,
    /// Nesting depth (0 for top-level nodes)
    pub depth: usize,
    /// Whether a group row is expanded (always false for leaves)
    pub is_expanded: bool,
}

impl VisibleRow<'_> {
    /// Identity of the node on this row
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.node.id()
    }
}

/// Flatten `root` under the given expansion state
///
/// Cost is linear in the number of emitted rows: collapsed subtrees are not
/// visited.
#[must_use]
pub fn flatten<'t>(root: &'t GroupNode, expanded: &HashSet<String>) -> Vec<VisibleRow<'t>> {
    let mut rows = Vec::new();
    push_children(root, 0, expanded, &mut rows);
    rows
}

fn push_children<'t>(
    group: &'t GroupNode,
    depth: usize,
    expanded: &HashSet<String>,
    rows: &mut Vec<VisibleRow<'t>>,
) {
    for child in group.children() {
        match child {
            Node::Leaf(_) => rows.push(VisibleRow {
                node: child,
                depth,
                is_expanded: false,
            }),
            Node::Group(g) => {
                let is_expanded = expanded.contains(g.path());
                rows.push(VisibleRow {
                    node: child,
                    depth,
                    is_expanded,
                });
                if is_expanded {
                    push_children(g, depth + 1, expanded, rows);
                }
            },
        }
    }
}

/// Index of the row showing `id`, if visible
#[must_use]
pub fn position_of(rows: &[VisibleRow<'_>], id: &NodeId) -> Option<usize> {
    rows.iter()
        .position(|row| row.node.kind() == id.kind && row.node.path() == id.path)
}
