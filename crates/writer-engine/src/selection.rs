//! Selection model and the tracker that keeps the last known selection
//! available after the editable region loses focus.

use std::fmt;

use crate::dom::{NodeId, Tree};
use crate::host::EditingHost;

/// A boundary point: a character offset inside a text node, or a child
/// index inside an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A collapsed range (a caret).
    pub fn caret(node: NodeId, offset: usize) -> Self {
        let at = Position::new(node, offset);
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// A non-empty set of ranges as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    ranges: Vec<Range>,
}

impl Selection {
    /// Returns `None` for an empty range list: a host without ranges has no selection.
    pub fn new(ranges: Vec<Range>) -> Option<Self> {
        if ranges.is_empty() {
            None
        } else {
            Some(Self { ranges })
        }
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn primary_range(&self) -> Range {
        self.ranges[0]
    }

    pub fn anchor_node(&self) -> NodeId {
        self.primary_range().start.node
    }

    /// The element the selection starts in: the anchor itself, or its parent
    /// when the anchor is a text node.
    pub fn start_element(&self, tree: &Tree) -> Option<NodeId> {
        start_element(tree, self.anchor_node())
    }
}

pub(crate) fn start_element(tree: &Tree, node: NodeId) -> Option<NodeId> {
    if tree.is_text(node) {
        tree.parent(node)
    } else {
        Some(node)
    }
}

/// The editor's authoritative snapshot of where the user was last acting.
///
/// Both fields are non-owning handles into the host tree and may go stale
/// when the host rewrites the nodes they point at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoredSelection {
    pub anchor_node: Option<NodeId>,
    pub primary_range: Option<Range>,
}

impl StoredSelection {
    pub fn is_empty(&self) -> bool {
        self.anchor_node.is_none()
    }
}

impl fmt::Display for StoredSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.anchor_node, self.primary_range) {
            (Some(anchor), Some(range)) => write!(
                f,
                "anchor {anchor} [{}:{} .. {}:{}]",
                range.start.node, range.start.offset, range.end.node, range.end.offset
            ),
            _ => f.write_str("no selection"),
        }
    }
}

/// Receives every selection captured while the region is editable.
pub trait SelectionListener {
    fn selection_changed(&mut self, selection: &StoredSelection);
}

impl<F> SelectionListener for F
where
    F: FnMut(&StoredSelection),
{
    fn selection_changed(&mut self, selection: &StoredSelection) {
        self(selection)
    }
}

/// Owns the [`StoredSelection`] of one editor instance.
#[derive(Default)]
pub struct SelectionTracker {
    stored: StoredSelection,
    listener: Option<Box<dyn SelectionListener>>,
}

impl fmt::Debug for SelectionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionTracker")
            .field("stored", &self.stored)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl SelectionTracker {
    pub fn new(listener: Option<Box<dyn SelectionListener>>) -> Self {
        Self {
            stored: StoredSelection::default(),
            listener,
        }
    }

    pub fn stored(&self) -> &StoredSelection {
        &self.stored
    }

    /// Snapshots the host's live selection.
    ///
    /// Without a live selection nothing changes and `false` is returned.
    /// The listener only hears about captures made while `editable` is true.
    pub fn capture<H: EditingHost + ?Sized>(&mut self, host: &H, editable: bool) -> bool {
        let Some(selection) = host.selection() else {
            return false;
        };
        self.stored = StoredSelection {
            anchor_node: Some(selection.anchor_node()),
            primary_range: Some(selection.primary_range()),
        };
        if editable && let Some(listener) = self.listener.as_mut() {
            listener.selection_changed(&self.stored);
        }
        true
    }
}
