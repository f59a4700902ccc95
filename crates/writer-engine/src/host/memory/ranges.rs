//! Boundary-point arithmetic over the tree: ordering points, isolating the
//! text a range covers, and inserting or deleting at a point.

use std::collections::HashMap;

use crate::classify::BlockTagSet;
use crate::dom::{NodeId, Tree};
use crate::selection::{Position, Range};

/// Pre-order index of every node under a root, used to compare boundary points.
pub(super) struct DocumentOrder {
    index: HashMap<NodeId, usize>,
}

impl DocumentOrder {
    pub(super) fn new(tree: &Tree, root: NodeId) -> Self {
        let index = std::iter::once(root)
            .chain(tree.descendants(root))
            .enumerate()
            .map(|(i, n)| (n, i))
            .collect();
        Self { index }
    }

    pub(super) fn index(&self, node: NodeId) -> Option<usize> {
        self.index.get(&node).copied()
    }

    /// Sort key of a boundary point, `None` when it lies outside the root.
    ///
    /// Element points resolve to the point before the child they name, or
    /// to the point after the element's subtree when the offset is past the end.
    pub(super) fn key(&self, tree: &Tree, pos: Position) -> Option<(usize, usize)> {
        let at = self.index(pos.node)?;
        if tree.is_text(pos.node) {
            return Some((at, pos.offset));
        }
        match tree.children(pos.node).get(pos.offset) {
            Some(&child) => Some((self.index(child)?, 0)),
            None => Some((at + tree.descendants(pos.node).len() + 1, 0)),
        }
    }
}

/// Character range `[from, to)` of `text` that falls between `start` and `end`.
fn covered(
    tree: &Tree,
    order: &DocumentOrder,
    text: NodeId,
    start: (usize, usize),
    end: (usize, usize),
) -> Option<(usize, usize)> {
    let idx = order.index(text)?;
    let len = tree.node_length(text);
    let from = match start.0.cmp(&idx) {
        std::cmp::Ordering::Less => 0,
        std::cmp::Ordering::Equal => start.1.min(len),
        std::cmp::Ordering::Greater => return None,
    };
    let to = match end.0.cmp(&idx) {
        std::cmp::Ordering::Greater => len,
        std::cmp::Ordering::Equal => end.1.min(len),
        std::cmp::Ordering::Less => return None,
    };
    (from < to).then_some((from, to))
}

fn ordered_keys(
    tree: &Tree,
    order: &DocumentOrder,
    range: Range,
) -> Option<((usize, usize), (usize, usize))> {
    let a = order.key(tree, range.start)?;
    let b = order.key(tree, range.end)?;
    Some(if a <= b { (a, b) } else { (b, a) })
}

/// Text nodes under `root` that the range touches, without modifying the tree.
pub(super) fn touched_text(tree: &Tree, root: NodeId, range: Range) -> Vec<NodeId> {
    let order = DocumentOrder::new(tree, root);
    let Some((start, end)) = ordered_keys(tree, &order, range) else {
        return Vec::new();
    };
    tree.text_nodes(root)
        .into_iter()
        .filter(|&t| covered(tree, &order, t, start, end).is_some())
        .collect()
}

/// Splits boundary text nodes so the range covers whole text nodes, and
/// returns those nodes in document order.
pub(super) fn isolate_text(tree: &mut Tree, root: NodeId, range: Range) -> Vec<NodeId> {
    let order = DocumentOrder::new(tree, root);
    let Some((start, end)) = ordered_keys(tree, &order, range) else {
        return Vec::new();
    };

    let spans: Vec<(NodeId, usize, usize)> = tree
        .text_nodes(root)
        .into_iter()
        .filter_map(|t| covered(tree, &order, t, start, end).map(|(from, to)| (t, from, to)))
        .collect();

    spans
        .into_iter()
        .map(|(text, from, to)| {
            let len = tree.node_length(text);
            if to < len {
                tree.split_text(text, to);
            }
            if from > 0 {
                tree.split_text(text, from).unwrap_or(text)
            } else {
                text
            }
        })
        .collect()
}

/// Range spanning the given text nodes from the first's start to the last's end.
pub(super) fn span_range(tree: &Tree, nodes: &[NodeId]) -> Option<Range> {
    let first = *nodes.first()?;
    let last = *nodes.last()?;
    Some(Range::new(
        Position::new(first, 0),
        Position::new(last, tree.node_length(last)),
    ))
}

/// Where a caret lands when placed at the start of `node`.
pub(super) fn first_caret(tree: &Tree, node: NodeId) -> Position {
    match tree.text_nodes(node).first() {
        Some(&text) => Position::new(text, 0),
        None => Position::new(node, 0),
    }
}

/// Where a caret lands when placed at the end of `node`.
pub(super) fn last_caret(tree: &Tree, node: NodeId) -> Position {
    match tree.text_nodes(node).last() {
        Some(&text) => Position::new(text, tree.node_length(text)),
        None => Position::new(node, tree.children(node).len()),
    }
}

/// Converts a point into `(parent, child index)` form, splitting a text node
/// when the point falls inside it.
pub(super) fn boundary(tree: &mut Tree, pos: Position) -> Option<(NodeId, usize)> {
    if !tree.is_text(pos.node) {
        return Some((pos.node, pos.offset.min(tree.children(pos.node).len())));
    }
    let parent = tree.parent(pos.node)?;
    let index = tree.child_index(pos.node)?;
    let len = tree.node_length(pos.node);
    if pos.offset == 0 {
        Some((parent, index))
    } else if pos.offset >= len {
        Some((parent, index + 1))
    } else {
        tree.split_text(pos.node, pos.offset);
        Some((parent, index + 1))
    }
}

/// Inserts `node` at a point. Returns the point right after it.
pub(super) fn insert_at(tree: &mut Tree, pos: Position, node: NodeId) -> Option<Position> {
    let (parent, index) = boundary(tree, pos)?;
    tree.insert_child(parent, index, node);
    Some(Position::new(parent, index + 1))
}

/// Removes a lone `<br>` placeholder from an otherwise empty element.
///
/// Returns `true` when one was removed.
pub(super) fn drop_placeholder_break(tree: &mut Tree, element: NodeId) -> bool {
    if let [only] = tree.children(element)
        && tree.is_tag(*only, "br")
    {
        let only = *only;
        tree.detach(only);
        return true;
    }
    false
}

/// True when the element has no text and no line break.
pub(super) fn is_blank(tree: &Tree, element: NodeId) -> bool {
    tree.text_content(element).is_empty()
        && !tree
            .descendants(element)
            .into_iter()
            .any(|n| tree.is_tag(n, "br"))
}

/// Puts a `<br>` into an element that would otherwise collapse to nothing.
pub(super) fn fill_blank(tree: &mut Tree, element: NodeId) {
    if is_blank(tree, element) {
        for child in tree.children(element).to_vec() {
            tree.detach(child);
        }
        let br = tree.create_element("br");
        tree.append_child(element, br);
    }
}

/// Removes inline elements under `node` that have no children left.
pub(super) fn prune_empty_inlines(tree: &mut Tree, node: NodeId, blocks: &BlockTagSet) {
    let mut changed = true;
    while changed {
        changed = false;
        for n in tree.descendants(node) {
            let empty_inline = tree
                .tag(n)
                .is_some_and(|tag| tag != "br" && !blocks.contains(tag))
                && tree.children(n).is_empty();
            if empty_inline {
                tree.detach(n);
                changed = true;
            }
        }
    }
}

/// Deletes the text covered by a range and returns the collapsed caret.
///
/// The caret is held by an empty text node left where the deleted content
/// started, so typing afterwards continues inside the same inline context.
pub(super) fn delete_contents(
    tree: &mut Tree,
    root: NodeId,
    range: Range,
    blocks: &BlockTagSet,
) -> Option<Position> {
    let (from, to) = {
        let order = DocumentOrder::new(tree, root);
        match (order.key(tree, range.start), order.key(tree, range.end)) {
            (Some(a), Some(b)) if a > b => (range.end, range.start),
            _ => (range.start, range.end),
        }
    };
    let start_block = blocks.nearest_block_ancestor(&*tree, from.node, Some(root));
    let end_block = blocks.nearest_block_ancestor(&*tree, to.node, Some(root));

    let segments = isolate_text(tree, root, range);
    let first = *segments.first()?;
    let parent = tree.parent(first)?;
    let marker = tree.create_text("");
    tree.insert_before(parent, marker, Some(first));

    let mut touched_blocks = vec![start_block];
    for &segment in &segments {
        let block = blocks.nearest_block_ancestor(&*tree, segment, Some(root));
        if !touched_blocks.contains(&block) && block != end_block {
            touched_blocks.push(block);
        }
    }
    if end_block != start_block {
        touched_blocks.push(end_block);
    }

    let is_inline = |tree: &Tree, el: NodeId| tree.tag(el).is_some_and(|t| !blocks.contains(t));
    for segment in segments {
        let mut current = tree.parent(segment);
        tree.detach(segment);
        while let Some(el) = current {
            if el == root || !tree.children(el).is_empty() || !is_inline(tree, el) {
                break;
            }
            current = tree.parent(el);
            tree.detach(el);
        }
    }

    // the marker alone must not keep an emptied inline element alive
    while let Some(parent) = tree.parent(marker) {
        let Some(grand) = tree.parent(parent) else {
            break;
        };
        if parent == root || tree.children(parent) != [marker] || !is_inline(tree, parent) {
            break;
        }
        tree.insert_before(grand, marker, Some(parent));
        tree.detach(parent);
    }

    join_touched_blocks(tree, root, &touched_blocks, marker);
    Some(Position::new(marker, 0))
}

/// After a deletion across blocks, pulls what is left of the last block into
/// the first one and drops the blocks the deletion emptied in between.
///
/// The caret `marker` ends up in the first block, where the deletion started.
fn join_touched_blocks(tree: &mut Tree, root: NodeId, touched: &[NodeId], marker: NodeId) {
    let [start, middle @ .., end] = touched else {
        return;
    };
    let nested = |tree: &Tree, a: NodeId, b: NodeId| tree.contains(a, b) || tree.contains(b, a);
    if *start == root || *end == root || nested(tree, *start, *end) {
        return;
    }
    if !tree.contains(*start, marker) {
        tree.append_child(*start, marker);
    }
    for &block in middle {
        if !nested(tree, *start, block) && tree.text_content(block).is_empty() {
            detach_emptied(tree, root, block);
        }
    }
    tree.move_children(*end, *start);
    detach_emptied(tree, root, *end);
}

/// Detaches `node`, then any container left empty by its removal.
fn detach_emptied(tree: &mut Tree, root: NodeId, node: NodeId) {
    let mut current = Some(node);
    while let Some(n) = current {
        if n == root {
            return;
        }
        current = tree.parent(n);
        tree.detach(n);
        if current.is_some_and(|p| !tree.children(p).is_empty()) {
            return;
        }
    }
}
