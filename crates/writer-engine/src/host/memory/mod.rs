//! In-memory editing host.
//!
//! Reproduces the parts of a browser's `contenteditable` behavior the editor
//! relies on, including the inconsistencies it has to repair. Primitives only
//! act inside an element carrying `contenteditable="true"`, like their native
//! counterparts.

mod blocks;
mod inline;
mod keys;
mod ranges;

use crate::classify::BlockTagSet;
use crate::dom::{NodeId, Tree};
use crate::error::DomError;
use crate::events::KeyInput;
use crate::host::{EditingHost, InlineStyle};
use crate::selection::{Position, Range, Selection};

/// Elements the host lays out as blocks: the editor's block tags plus `div`.
const HOST_BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "ul", "ol", "li", "div",
];

/// Which engine quirks the host reproduces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostProfile {
    /// Format-block `blockquote` wraps the block in a new quote instead of
    /// renaming it, nesting quotes when applied inside one.
    pub nest_block_quotes: bool,
    /// Inserted text is wrapped in a styled `span`.
    pub wrap_inserted_text: bool,
}

impl HostProfile {
    pub fn chromium() -> Self {
        Self {
            nest_block_quotes: false,
            wrap_inserted_text: true,
        }
    }

    pub fn gecko() -> Self {
        Self {
            nest_block_quotes: true,
            wrap_inserted_text: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryHost {
    tree: Tree,
    ranges: Vec<Range>,
    focused: Option<NodeId>,
    profile: HostProfile,
    blocks: BlockTagSet,
}

impl MemoryHost {
    pub fn new(profile: HostProfile) -> Self {
        Self {
            tree: Tree::new(),
            ranges: Vec::new(),
            focused: None,
            profile,
            blocks: BlockTagSet::new(HOST_BLOCK_TAGS),
        }
    }

    /// Creates a host whose document body holds `html`.
    pub fn from_html(html: &str, profile: HostProfile) -> Result<Self, DomError> {
        let mut host = Self::new(profile);
        let root = host.tree.root();
        host.tree.set_inner_html(root, html)?;
        host.tree.take_insertions();
        Ok(host)
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Replaces the selection with a single range.
    pub fn select(&mut self, range: Range) {
        self.set_selection(&[range]);
    }

    /// True when both ends of the range name nodes of this document.
    fn owns(&self, range: &Range) -> bool {
        self.tree.has_node(range.start.node) && self.tree.has_node(range.end.node)
    }

    pub fn clear_selection(&mut self) {
        self.ranges.clear();
    }

    fn set_caret(&mut self, pos: Position) {
        self.ranges = vec![Range::new(pos, pos)];
    }

    /// Points selection boundaries that referenced `from` at `to` instead.
    fn remap(&mut self, from: NodeId, to: NodeId) {
        for range in &mut self.ranges {
            for pos in [&mut range.start, &mut range.end] {
                if pos.node == from {
                    *pos = ranges::first_caret(&self.tree, to);
                }
            }
        }
    }

    /// Nearest element marked editable, `None` when the node is read-only.
    fn editing_root(&self, node: NodeId) -> Option<NodeId> {
        std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .find_map(|n| match self.tree.attribute(n, "contenteditable") {
                Some("true") => Some(Some(n)),
                Some(_) => Some(None),
                None => None,
            })
            .flatten()
    }

    /// The primary range and the editable root it starts in.
    fn active(&self) -> Option<(Range, NodeId)> {
        let range = *self.ranges.first()?;
        let root = self.editing_root(range.start.node)?;
        Some((range, root))
    }

    fn block_of(&self, node: NodeId, root: NodeId) -> NodeId {
        self.blocks.nearest_block_ancestor(&self.tree, node, Some(root))
    }

    fn is_block(&self, node: NodeId) -> bool {
        self.tree.tag(node).is_some_and(|t| self.blocks.contains(t))
    }
}

impl EditingHost for MemoryHost {
    fn document(&self) -> &Tree {
        &self.tree
    }

    fn document_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    fn selection(&self) -> Option<Selection> {
        Selection::new(self.ranges.clone())
    }

    fn set_selection(&mut self, ranges: &[Range]) {
        // ranges from another document are dropped like detached ones
        self.ranges = ranges.iter().filter(|r| self.owns(r)).copied().collect();
    }

    fn focus(&mut self, node: NodeId) {
        if !self.tree.has_node(node) {
            return;
        }
        self.focused = Some(node);
        if self.editing_root(node).is_none() {
            return;
        }
        let inside = self
            .ranges
            .first()
            .is_some_and(|r| self.tree.contains(node, r.start.node));
        if !inside {
            let caret = ranges::first_caret(&self.tree, node);
            self.set_caret(caret);
        }
    }

    fn apply_inline_style(&mut self, style: InlineStyle) {
        if style.is_list() {
            self.toggle_list(style.tag());
        } else {
            self.toggle_inline(style.tag());
        }
    }

    fn apply_block_format(&mut self, tag: &str) {
        self.format_block(&tag.to_ascii_lowercase());
    }

    fn outdent(&mut self) {
        self.outdent_block();
    }

    fn create_link(&mut self, reference: &str) {
        self.link(reference);
    }

    fn remove_link(&mut self) {
        self.unlink();
    }

    fn insert_text(&mut self, text: &str) {
        self.insert_plain_text(text);
    }

    fn perform_key_default(&mut self, key: &KeyInput) {
        self.key_default(key);
    }
}
