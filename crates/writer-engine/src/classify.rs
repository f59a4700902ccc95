//! Block classification: finding the nearest block-level ancestor of a node.
//!
//! The walk only needs "parent of" and "tag of", so it is written against
//! [`NodeAncestry`] rather than a concrete tree.

use crate::dom::{NodeId, Tree};

/// Minimal view of a node hierarchy: parent links and tag names.
pub trait NodeAncestry {
    type Node: Copy + Eq;

    fn parent_of(&self, node: Self::Node) -> Option<Self::Node>;

    /// Tag name of an element, `None` for text nodes.
    fn tag_of(&self, node: Self::Node) -> Option<&str>;
}

impl NodeAncestry for Tree {
    type Node = NodeId;

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node)
    }

    fn tag_of(&self, node: NodeId) -> Option<&str> {
        self.tag(node)
    }
}

pub const DEFAULT_BLOCK_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "pre",
    "ul",
    "ol",
    "li",
];

/// Ordered set of tags treated as block-level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTagSet {
    tags: &'static [&'static str],
}

impl Default for BlockTagSet {
    fn default() -> Self {
        Self {
            tags: DEFAULT_BLOCK_TAGS,
        }
    }
}

impl BlockTagSet {
    pub fn new(tags: &'static [&'static str]) -> Self {
        Self { tags }
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Nearest node at or above `node` whose tag is in the set.
    ///
    /// Text nodes start the walk at their parent. The walk stops at
    /// `boundary` (the editable region acts as an implicit block) or at the
    /// top of the chain; in both cases that last node is returned.
    pub fn nearest_block_ancestor<A: NodeAncestry>(
        &self,
        tree: &A,
        node: A::Node,
        boundary: Option<A::Node>,
    ) -> A::Node {
        let mut current = match tree.tag_of(node) {
            Some(_) => node,
            None => match tree.parent_of(node) {
                Some(parent) => parent,
                None => return node,
            },
        };

        loop {
            if tree.tag_of(current).is_some_and(|tag| self.contains(tag))
                || Some(current) == boundary
            {
                return current;
            }
            match tree.parent_of(current) {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }
}
