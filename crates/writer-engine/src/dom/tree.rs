use std::collections::BTreeMap;
use std::fmt;

/// Handle to a node owned by a [`Tree`].
///
/// Ids are never reused: a detached node keeps its id and can be re-attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element payload: lower-case tag, attributes and class list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document tree standing in for the host's structural model.
///
/// The tree always has a `body` root. Element nodes inserted under the root
/// are recorded so observers can react to insertions they did not perform,
/// see [`Tree::take_insertions`].
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    insertions: Vec<NodeId>,
    version: u64,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            insertions: Vec::new(),
            version: 0,
        };
        tree.root = tree.create_element("body");
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.version += 1;
        &mut self.nodes[id.0]
    }

    /// True when `id` was handed out by this tree.
    pub fn has_node(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Counter bumped by every mutation of an existing node, for change detection.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Creates a detached element. The tag is stored lower-cased.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
        }))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element(el) => Some(el.tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    /// True when `id` is an element with the given (lower-case) tag.
    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Text(_))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        !self.is_text(id)
    }

    /// Content of a text node, `None` for elements.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(text) => Some(text.as_str()),
            NodeKind::Element(_) => None,
        }
    }

    /// Replaces the content of a text node. Elements are left untouched.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let NodeKind::Text(existing) = &mut self.node_mut(id).kind {
            *existing = text.into();
        }
    }

    /// Number of positions inside a node: characters for text, children for elements.
    pub fn node_length(&self, id: NodeId) -> usize {
        match &self.node(id).kind {
            NodeKind::Text(text) => text.chars().count(),
            NodeKind::Element(_) => self.node(id).children.len(),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.last().copied()
    }

    /// Position of `id` among its parent's children.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.child_index(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.child_index(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Walks parent links, nearest first. Does not include `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// True when `node` is `ancestor` or lies beneath it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// True when the node is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// All nodes beneath `id` in document (pre-)order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Text nodes beneath `id` (or `id` itself when it is text), in document order.
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        if self.is_text(id) {
            return vec![id];
        }
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.is_text(n))
            .collect()
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_nodes(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Removes a node from its parent. The node and its subtree stay valid.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
            self.node_mut(id).parent = None;
        }
    }

    /// Inserts `child` at `index` under `parent`, detaching it from any previous parent.
    ///
    /// The index is clamped to the number of children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if self.contains(child, parent) {
            return;
        }
        self.detach(child);
        let len = self.node(parent).children.len();
        self.node_mut(parent).children.insert(index.min(len), child);
        self.node_mut(child).parent = Some(parent);
        self.record_insertion(child);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.node(parent).children.len();
        self.insert_child(parent, len, child);
    }

    /// Inserts `child` under `parent` before `reference`, or last when `reference` is `None`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let index = reference
            .filter(|&r| self.parent(r) == Some(parent))
            .and_then(|r| self.child_index(r))
            .unwrap_or(self.node(parent).children.len());
        self.insert_child(parent, index, child);
    }

    /// Inserts `node` as the sibling immediately following `reference`.
    ///
    /// Returns `false` when `reference` has no parent.
    pub fn insert_after(&mut self, node: NodeId, reference: NodeId) -> bool {
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        let next = self.next_sibling(reference);
        self.insert_before(parent, node, next);
        true
    }

    /// Moves all children of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children = self.node(from).children.clone();
        for child in children {
            self.append_child(to, child);
        }
    }

    /// Replaces `id` by its children, in place, then detaches `id`.
    pub fn unwrap_element(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let children = self.node(id).children.clone();
        for child in children {
            self.insert_before(parent, child, Some(id));
        }
        self.detach(id);
    }

    /// Puts `wrapper` where `node` is and moves `node` inside it.
    pub fn wrap(&mut self, node: NodeId, wrapper: NodeId) {
        if let Some(parent) = self.parent(node) {
            self.insert_before(parent, wrapper, Some(node));
        }
        self.append_child(wrapper, node);
    }

    /// Creates a detached copy of a node without its children.
    pub fn clone_shallow(&mut self, id: NodeId) -> NodeId {
        let kind = self.node(id).kind.clone();
        self.push(kind)
    }

    /// Changes an element's tag while keeping its identity, children and attributes.
    pub fn rename_element(&mut self, id: NodeId, tag: &str) {
        if let NodeKind::Element(el) = &mut self.node_mut(id).kind {
            el.tag = tag.to_ascii_lowercase();
        }
    }

    /// Splits a text node at a character offset.
    ///
    /// The original node keeps the text before `offset`; the returned node holds
    /// the rest and is inserted right after it. Returns `None` for elements and
    /// for offsets at either end.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        let text = self.text(id)?.to_string();
        let len = text.chars().count();
        if offset == 0 || offset >= len {
            return None;
        }
        let at = byte_index(&text, offset);
        let (head, tail) = text.split_at(at);
        let tail = self.create_text(tail);
        self.set_text(id, head);
        if self.parent(id).is_some() {
            self.insert_after(tail, id);
        }
        Some(tail)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        // classes live in their own list, see `classes`
        match &self.node(id).kind {
            NodeKind::Element(el) => el.attributes.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if name == "class" {
            for class in value.split_whitespace() {
                self.add_class(id, class);
            }
            return;
        }
        if let NodeKind::Element(el) = &mut self.node_mut(id).kind {
            el.attributes.insert(name.to_ascii_lowercase(), value);
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let NodeKind::Element(el) = &mut self.node_mut(id).kind {
            el.classes.retain(|c| c != class);
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element(el) = &mut self.node_mut(id).kind {
            el.attributes.remove(name);
        }
    }

    pub fn classes(&self, id: NodeId) -> &[String] {
        match &self.node(id).kind {
            NodeKind::Element(el) => &el.classes,
            NodeKind::Text(_) => &[],
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        if let NodeKind::Element(el) = &mut self.node_mut(id).kind {
            el.classes.push(class.to_string());
        }
    }

    /// Drains the element insertions recorded since the last call.
    ///
    /// Only insertions into the attached tree are recorded; inserting a subtree
    /// records its root and every element inside it.
    pub fn take_insertions(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.insertions)
    }

    fn record_insertion(&mut self, id: NodeId) {
        if !self.is_attached(id) {
            return;
        }
        let mut inserted = vec![id];
        inserted.extend(self.descendants(id));
        let elements: Vec<NodeId> = inserted
            .into_iter()
            .filter(|&n| self.is_element(n))
            .collect();
        self.insertions.extend(elements);
    }
}

/// Byte index of the `offset`-th character, clamped to the string length.
pub(crate) fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraph(tree: &mut Tree, text: &str) -> (NodeId, NodeId) {
        let p = tree.create_element("P");
        let t = tree.create_text(text);
        tree.append_child(p, t);
        (p, t)
    }

    #[test]
    fn tags_are_lower_cased() {
        let mut tree = Tree::new();
        let (p, _) = paragraph(&mut tree, "x");
        assert_eq!(tree.tag(p), Some("p"));
        assert!(tree.is_tag(p, "p"));
    }

    #[test]
    fn siblings_and_indices() {
        let mut tree = Tree::new();
        let root = tree.root();
        let (a, _) = paragraph(&mut tree, "a");
        let (b, _) = paragraph(&mut tree, "b");
        tree.append_child(root, a);
        tree.append_child(root, b);

        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.previous_sibling(b), Some(a));
        assert_eq!(tree.previous_sibling(a), None);
        assert_eq!(tree.child_index(b), Some(1));
    }

    #[test]
    fn insert_after_places_node_immediately_following() {
        let mut tree = Tree::new();
        let root = tree.root();
        let (a, _) = paragraph(&mut tree, "a");
        let (c, _) = paragraph(&mut tree, "c");
        tree.append_child(root, a);
        tree.append_child(root, c);
        let (b, _) = paragraph(&mut tree, "b");

        assert!(tree.insert_after(b, a));
        assert_eq!(tree.children(root), &[a, b, c]);
    }

    #[test]
    fn unwrap_keeps_children_in_place() {
        let mut tree = Tree::new();
        let root = tree.root();
        let (p, first) = paragraph(&mut tree, "one ");
        tree.append_child(root, p);
        let span = tree.create_element("span");
        let inner = tree.create_text("two");
        tree.append_child(span, inner);
        tree.append_child(p, span);
        let last = tree.create_text(" three");
        tree.append_child(p, last);

        tree.unwrap_element(span);

        assert_eq!(tree.children(p), &[first, inner, last]);
        assert_eq!(tree.parent(span), None);
        assert_eq!(tree.text_content(p), "one two three");
    }

    #[test]
    fn split_text_by_characters() {
        let mut tree = Tree::new();
        let (p, t) = paragraph(&mut tree, "héllo");

        let tail = tree.split_text(t, 2).unwrap();

        assert_eq!(tree.text(t), Some("hé"));
        assert_eq!(tree.text(tail), Some("llo"));
        assert_eq!(tree.children(p), &[t, tail]);
        assert_eq!(tree.split_text(t, 0), None);
        assert_eq!(tree.split_text(t, 2), None);
    }

    #[test]
    fn rename_preserves_identity() {
        let mut tree = Tree::new();
        let (p, t) = paragraph(&mut tree, "x");
        tree.rename_element(p, "H1");
        assert_eq!(tree.tag(p), Some("h1"));
        assert_eq!(tree.parent(t), Some(p));
    }

    #[test]
    fn insertions_are_recorded_only_when_attached() {
        let mut tree = Tree::new();
        let root = tree.root();
        let (p, _) = paragraph(&mut tree, "x");
        let b = tree.create_element("b");
        tree.append_child(p, b);
        assert!(tree.take_insertions().is_empty());

        tree.append_child(root, p);
        assert_eq!(tree.take_insertions(), vec![p, b]);
        assert!(tree.take_insertions().is_empty());
    }

    #[test]
    fn cannot_insert_ancestor_into_descendant() {
        let mut tree = Tree::new();
        let root = tree.root();
        let (p, _) = paragraph(&mut tree, "x");
        tree.append_child(root, p);
        tree.append_child(p, root);
        assert_eq!(tree.parent(root), None);
        assert!(tree.contains(root, p));
    }

    #[test]
    fn class_attribute_is_split_into_class_list() {
        let mut tree = Tree::new();
        let div = tree.create_element("div");
        tree.set_attribute(div, "class", "editor  main");
        tree.add_class(div, "editor");
        assert_eq!(tree.classes(div), &["editor".to_string(), "main".to_string()]);
        assert!(tree.has_class(div, "main"));
    }

    #[test]
    fn text_content_and_descendants_in_document_order() {
        let mut tree = Tree::new();
        let ul = tree.create_element("ul");
        let (li1, _) = paragraph(&mut tree, "a");
        let (li2, _) = paragraph(&mut tree, "b");
        tree.rename_element(li1, "li");
        tree.rename_element(li2, "li");
        tree.append_child(ul, li1);
        tree.append_child(ul, li2);

        assert_eq!(tree.text_content(ul), "ab");
        assert_eq!(tree.descendants(ul).len(), 4);
        assert_eq!(tree.descendants(ul)[0], li1);
    }

    #[test]
    fn version_moves_only_on_mutation() {
        let mut tree = Tree::new();
        let root = tree.root();
        let (p, _) = paragraph(&mut tree, "a");
        let before = tree.version();

        let _ = tree.text_content(p);
        tree.detach(p);
        assert_eq!(tree.version(), before);

        tree.append_child(root, p);
        assert!(tree.version() > before);
    }

    #[test]
    fn foreign_ids_are_not_owned() {
        let mut other = Tree::new();
        for _ in 0..10 {
            other.create_element("p");
        }
        let foreign = other.create_element("p");

        let tree = Tree::new();
        assert!(tree.has_node(tree.root()));
        assert!(!tree.has_node(foreign));
    }
}
