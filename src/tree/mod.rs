//! Merged tensor hierarchy
//!
//! Every tensor's dotted name is split on `.`; each segment but the last
//! becomes a [`GroupNode`], the last becomes a leaf holding the
//! [`TensorRecord`]. Records from any number of files merge into one tree.
//!
//! ```text
//! model.layers.0.mlp.weight  ─┐
//! model.layers.0.mlp.bias    ─┼─>  model ─ layers ─┬─ 0 ─ mlp ─┬─ bias
//! model.layers.1.mlp.weight  ─┘                    │           └─ weight
//!                                                  └─ 1 ─ mlp ─── weight
//! ```
//!
//! Groups carry `tensor_count` and `total_bytes` for their whole subtree.
//! They are maintained incrementally on insert: a replaced leaf contributes
//! its signed size delta, never a second count.
//!
//! Children live in a `BTreeMap` keyed by natural order, so sibling order is
//! always ready for flattening without a separate sort pass.

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::natural::NaturalKey;
use crate::record::TensorRecord;

/// Leaf or group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    /// A tensor
    Leaf,
    /// A path prefix shared by one or more tensors
    Group,
}

/// Key of a child inside its parent group
///
/// A tensor `a.b` and a group `a.b` (from `a.b.c`) can coexist, so the kind
/// is part of the key. Ordering is by segment first; the leaf sorts before
/// a group with the same segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChildKey {
    segment: NaturalKey,
    kind: NodeKind,
}

impl ChildKey {
    fn new(segment: &str, kind: NodeKind) -> Self {
        Self {
            segment: NaturalKey::new(segment),
            kind,
        }
    }

    /// Segment name
    #[must_use]
    pub fn segment(&self) -> &str {
        self.segment.as_str()
    }

    /// Kind of node stored under this key
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }
}

/// Stable identity of a node: kind plus full dotted path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId {
    /// Leaf or group
    pub kind: NodeKind,
    /// Full dotted path from the root
    pub path: String,
}

/// Interior node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupNode {
    name: String,
    path: String,
    children: BTreeMap<ChildKey, Node>,
    tensor_count: u64,
    total_bytes: u64,
}

impl GroupNode {
    fn new(name: &str, path: String) -> Self {
        Self {
            name: name.to_string(),
            path,
            ..Self::default()
        }
    }

    /// Segment name (empty for the root)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full dotted path, the group's identity (empty for the root)
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of tensors in this subtree
    #[must_use]
    pub fn tensor_count(&self) -> u64 {
        self.tensor_count
    }

    /// Total payload bytes in this subtree
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Children in natural order
    pub fn children(&self) -> btree_map::Values<'_, ChildKey, Node> {
        self.children.values()
    }

    /// Number of direct children
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Direct child group by segment
    #[must_use]
    pub fn child_group(&self, segment: &str) -> Option<&GroupNode> {
        match self.children.get(&ChildKey::new(segment, NodeKind::Group)) {
            Some(Node::Group(g)) => Some(g),
            _ => None,
        }
    }

    /// Direct child leaf by segment
    #[must_use]
    pub fn child_leaf(&self, segment: &str) -> Option<&TensorRecord> {
        match self.children.get(&ChildKey::new(segment, NodeKind::Leaf)) {
            Some(Node::Leaf(r)) => Some(r),
            _ => None,
        }
    }
}

/// Tree node: a group or a tensor leaf
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Interior node
    Group(GroupNode),
    /// Tensor
    Leaf(TensorRecord),
}

impl Node {
    /// Display name (last segment)
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Group(g) => g.name(),
            Self::Leaf(r) => r.leaf_name(),
        }
    }

    /// Full dotted path
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Group(g) => g.path(),
            Self::Leaf(r) => &r.name,
        }
    }

    /// Leaf or group
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Group(_) => NodeKind::Group,
            Self::Leaf(_) => NodeKind::Leaf,
        }
    }

    /// Identity used to track the cursor across re-flattening
    #[must_use]
    pub fn id(&self) -> NodeId {
        NodeId {
            kind: self.kind(),
            path: self.path().to_string(),
        }
    }

    /// Tensors in this subtree (1 for a leaf)
    #[must_use]
    pub fn tensor_count(&self) -> u64 {
        match self {
            Self::Group(g) => g.tensor_count(),
            Self::Leaf(_) => 1,
        }
    }

    /// Payload bytes in this subtree
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        match self {
            Self::Group(g) => g.total_bytes(),
            Self::Leaf(r) => r.byte_size,
        }
    }

    /// Group view
    #[must_use]
    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            Self::Group(g) => Some(g),
            Self::Leaf(_) => None,
        }
    }

    /// Leaf view
    #[must_use]
    pub fn as_leaf(&self) -> Option<&TensorRecord> {
        match self {
            Self::Leaf(r) => Some(r),
            Self::Group(_) => None,
        }
    }

    /// True for groups
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

/// What [`TensorTree::insert`] did
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// A new tensor was added
    Inserted,
    /// A tensor with the same name existed and was replaced
    Replaced {
        /// The record that was overwritten
        previous: TensorRecord,
    },
}

/// The merged tensor tree
#[derive(Debug, Clone, Default)]
pub struct TensorTree {
    root: GroupNode,
    generation: u64,
}

impl TensorTree {
    /// Empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree by inserting `records` in order (later names win)
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = TensorRecord>,
    {
        let mut tree = Self::new();
        for record in records {
            tree.insert(record);
        }
        tree
    }

    /// Insert or replace a tensor
    pub fn insert(&mut self, record: TensorRecord) -> InsertOutcome {
        let name = record.name.clone();
        let segments: Vec<&str> = name.split('.').collect();
        self.generation += 1;
        match insert_at(&mut self.root, true, &segments, record) {
            Some(previous) => InsertOutcome::Replaced { previous },
            None => InsertOutcome::Inserted,
        }
    }

    /// Synthetic root group
    #[must_use]
    pub fn root(&self) -> &GroupNode {
        &self.root
    }

    /// Total number of tensors
    #[must_use]
    pub fn tensor_count(&self) -> u64 {
        self.root.tensor_count
    }

    /// Total payload bytes
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.root.total_bytes
    }

    /// Total element count over all tensors
    #[must_use]
    pub fn total_parameters(&self) -> u64 {
        self.leaves()
            .fold(0u64, |acc, r| acc.saturating_add(r.num_elements()))
    }

    /// True when no tensor has been inserted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Mutation counter; changes on every insert
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Look up a tensor by full dotted name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&TensorRecord> {
        let mut segments: Vec<&str> = name.split('.').collect();
        let last = segments.pop()?;
        let mut group = &self.root;
        for segment in segments {
            group = group.child_group(segment)?;
        }
        group.child_leaf(last)
    }

    /// Look up a group by full dotted path (`""` is the root)
    #[must_use]
    pub fn group(&self, path: &str) -> Option<&GroupNode> {
        if path.is_empty() {
            return Some(&self.root);
        }
        let mut group = &self.root;
        for segment in path.split('.') {
            group = group.child_group(segment)?;
        }
        Some(group)
    }

    /// All tensors, depth-first in natural order
    #[must_use]
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            stack: vec![self.root.children()],
        }
    }
}

/// Returns the replaced record, if any, and updates this group's aggregates
fn insert_at(
    group: &mut GroupNode,
    is_root: bool,
    segments: &[&str],
    record: TensorRecord,
) -> Option<TensorRecord> {
    let new_bytes = record.byte_size;
    let previous = match segments {
        [] => return None,
        [last] => {
            let key = ChildKey::new(last, NodeKind::Leaf);
            match group.children.insert(key, Node::Leaf(record)) {
                Some(Node::Leaf(old)) => Some(old),
                _ => None,
            }
        },
        [head, rest @ ..] => {
            let path = if is_root {
                (*head).to_string()
            } else {
                format!("{}.{}", group.path, head)
            };
            let child = group
                .children
                .entry(ChildKey::new(head, NodeKind::Group))
                .or_insert_with(|| Node::Group(GroupNode::new(head, path)));
            let Node::Group(child) = child else {
                return None;
            };
            insert_at(child, false, rest, record)
        },
    };

    match &previous {
        Some(old) => {
            group.total_bytes = group
                .total_bytes
                .saturating_sub(old.byte_size)
                .saturating_add(new_bytes);
        },
        None => {
            group.tensor_count += 1;
            group.total_bytes = group.total_bytes.saturating_add(new_bytes);
        },
    }
    previous
}

/// Depth-first iterator over tensors
pub struct Leaves<'t> {
    stack: Vec<btree_map::Values<'t, ChildKey, Node>>,
}

impl<'t> Iterator for Leaves<'t> {
    type Item = &'t TensorRecord;

    fn next(&mut self) -> Option<&'t TensorRecord> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(Node::Leaf(record)) => return Some(record),
                Some(Node::Group(group)) => self.stack.push(group.children()),
                None => {
                    self.stack.pop();
                },
            }
        }
    }
}
