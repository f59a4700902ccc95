use super::MemoryHost;
use super::ranges;
use crate::dom::NodeId;
use crate::selection::{Position, Range};

impl MemoryHost {
    /// Blocks the range touches, in document order. A collapsed range yields
    /// the block around its start.
    fn blocks_in(&self, range: Range, root: NodeId) -> Vec<NodeId> {
        let mut blocks = Vec::new();
        for text in ranges::touched_text(&self.tree, root, range) {
            let block = self.block_of(text, root);
            if !blocks.contains(&block) {
                blocks.push(block);
            }
        }
        if blocks.is_empty() {
            blocks.push(self.block_of(range.start.node, root));
        }
        blocks
    }

    pub(super) fn format_block(&mut self, tag: &str) {
        let Some((range, root)) = self.active() else {
            return;
        };
        for block in self.blocks_in(range, root) {
            if block == root {
                self.wrap_inline_run(root, range.start, tag);
            } else if tag == "blockquote" && self.profile.nest_block_quotes {
                let quote = self.tree.create_element("blockquote");
                self.tree.wrap(block, quote);
            } else if self.tree.is_tag(block, "li") && tag != "li" {
                let inner = self.tree.create_element(tag);
                self.tree.move_children(block, inner);
                self.tree.append_child(block, inner);
                self.remap(block, inner);
            } else if self.tree.is_tag(block, "ul") || self.tree.is_tag(block, "ol") {
                continue;
            } else {
                self.tree.rename_element(block, tag);
            }
        }
    }

    /// Wraps the run of inline content around `at` (a point directly inside
    /// `root`'s loose content) into a new `tag` element and returns it.
    pub(super) fn wrap_inline_run(&mut self, root: NodeId, at: Position, tag: &str) -> NodeId {
        let element = self.tree.create_element(tag);

        let anchor = if at.node == root {
            let children = self.tree.children(root);
            children
                .get(at.offset)
                .or_else(|| children.last())
                .copied()
        } else {
            std::iter::once(at.node)
                .chain(self.tree.ancestors(at.node))
                .find(|&n| self.tree.parent(n) == Some(root))
        };

        let Some(anchor) = anchor else {
            let br = self.tree.create_element("br");
            self.tree.append_child(element, br);
            self.tree.append_child(root, element);
            self.set_caret(Position::new(element, 0));
            return element;
        };

        if self.is_block(anchor) {
            self.tree.rename_element(anchor, tag);
            return anchor;
        }

        let is_edge = |host: &Self, n: NodeId| host.is_block(n) || host.tree.is_tag(n, "br");
        let mut first = anchor;
        while let Some(prev) = self.tree.previous_sibling(first) {
            if is_edge(self, prev) {
                break;
            }
            first = prev;
        }
        let mut run = vec![first];
        let mut last = first;
        while let Some(next) = self.tree.next_sibling(last) {
            if is_edge(self, next) {
                break;
            }
            run.push(next);
            last = next;
        }

        self.tree.insert_before(root, element, Some(first));
        for node in run {
            self.tree.append_child(element, node);
        }
        self.remap(root, element);
        element
    }

    /// Moves `child` out of `container` to just after it. Siblings that
    /// followed `child` go into a copy of `container` placed after `child`;
    /// an emptied `container` is removed.
    pub(super) fn lift(&mut self, container: NodeId, child: NodeId) {
        let Some(index) = self.tree.child_index(child) else {
            return;
        };
        let following = self.tree.children(container)[index + 1..].to_vec();
        if !following.is_empty() {
            let rest = self.tree.clone_shallow(container);
            for node in following {
                self.tree.append_child(rest, node);
            }
            self.tree.insert_after(rest, container);
        }
        self.tree.insert_after(child, container);
        if self.tree.children(container).is_empty() {
            self.tree.detach(container);
        }
    }

    pub(super) fn outdent_block(&mut self) {
        let Some((range, root)) = self.active() else {
            return;
        };
        let block = self.block_of(range.start.node, root);
        let Some(quote) = std::iter::once(block)
            .chain(self.tree.ancestors(block))
            .take_while(|&n| n != root)
            .find(|&n| self.tree.is_tag(n, "blockquote"))
        else {
            return;
        };

        if quote == block {
            self.tree.unwrap_element(quote);
            return;
        }
        let Some(branch) = std::iter::once(block)
            .chain(self.tree.ancestors(block))
            .find(|&n| self.tree.parent(n) == Some(quote))
        else {
            return;
        };
        self.lift(quote, branch);
    }

    pub(super) fn toggle_list(&mut self, list_tag: &str) {
        let Some((range, root)) = self.active() else {
            return;
        };
        let block = self.block_of(range.start.node, root);
        let item = std::iter::once(block)
            .chain(self.tree.ancestors(block))
            .take_while(|&n| n != root)
            .find(|&n| self.tree.is_tag(n, "li"));

        if let Some(item) = item {
            let Some(list) = self.tree.parent(item) else {
                return;
            };
            if self.tree.is_tag(list, list_tag) {
                self.tree.rename_element(item, "p");
                self.lift(list, item);
            } else {
                self.tree.rename_element(list, list_tag);
            }
            return;
        }

        if self.tree.is_tag(block, "ul") || self.tree.is_tag(block, "ol") {
            self.tree.rename_element(block, list_tag);
            return;
        }

        let list = self.tree.create_element(list_tag);
        if block == root {
            let item = self.wrap_inline_run(root, range.start, "li");
            self.tree.wrap(item, list);
            return;
        }

        let item = self.tree.create_element("li");
        self.tree.wrap(block, list);
        self.tree.move_children(block, item);
        self.tree.append_child(list, item);
        self.tree.detach(block);
        self.remap(block, item);
    }
}
