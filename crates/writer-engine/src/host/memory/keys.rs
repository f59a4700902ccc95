use super::MemoryHost;
use super::ranges::{self, DocumentOrder};
use crate::dom::NodeId;
use crate::events::{Key, KeyInput};
use crate::selection::Position;

/// Blocks whose tag carries over to the block created by Enter.
const CONTINUED_BY_ENTER: [&str; 4] = ["p", "li", "div", "blockquote"];

impl MemoryHost {
    pub(super) fn key_default(&mut self, key: &KeyInput) {
        let Some((_, root)) = self.active() else {
            return;
        };
        match &key.key {
            Key::Char(c) => self.insert_plain_text(&c.to_string()),
            Key::Enter if key.shift => self.line_break(root),
            Key::Enter => self.split_block(root),
            Key::Backspace => self.backspace(root),
            Key::Other(_) => {}
        }
    }

    /// Collapses the selection, deleting its content first when needed.
    fn collapse_for_typing(&mut self, root: NodeId) -> Option<Position> {
        let range = *self.ranges.first()?;
        if range.is_collapsed() {
            return Some(range.start);
        }
        let caret = ranges::delete_contents(&mut self.tree, root, range, &self.blocks)
            .unwrap_or(range.start);
        self.set_caret(caret);
        Some(caret)
    }

    fn line_break(&mut self, root: NodeId) {
        let Some(caret) = self.collapse_for_typing(root) else {
            return;
        };
        let br = self.tree.create_element("br");
        if let Some(after) = ranges::insert_at(&mut self.tree, caret, br) {
            self.set_caret(after);
        }
    }

    fn split_block(&mut self, root: NodeId) {
        let Some(mut caret) = self.collapse_for_typing(root) else {
            return;
        };
        let mut block = self.block_of(caret.node, root);
        if block == root {
            block = self.wrap_inline_run(root, caret, "div");
            if let Some(range) = self.ranges.first() {
                caret = range.start;
            }
        }

        let Some((mut parent, mut index)) = ranges::boundary(&mut self.tree, caret) else {
            return;
        };
        // split inline ancestors between the caret and the block
        while parent != block {
            let Some(grand) = self.tree.parent(parent) else {
                return;
            };
            let copy = self.tree.clone_shallow(parent);
            for node in self.tree.children(parent)[index..].to_vec() {
                self.tree.append_child(copy, node);
            }
            self.tree.insert_after(copy, parent);
            index = self.tree.child_index(parent).map_or(0, |i| i + 1);
            parent = grand;
        }

        let tag = self
            .tree
            .tag(block)
            .filter(|t| CONTINUED_BY_ENTER.contains(t))
            .unwrap_or("div")
            .to_string();
        let next = self.tree.create_element(&tag);
        for node in self.tree.children(block)[index..].to_vec() {
            self.tree.append_child(next, node);
        }
        self.tree.insert_after(next, block);

        for half in [block, next] {
            ranges::prune_empty_inlines(&mut self.tree, half, &self.blocks);
            ranges::fill_blank(&mut self.tree, half);
        }
        let caret = ranges::first_caret(&self.tree, next);
        self.set_caret(caret);
    }

    fn backspace(&mut self, root: NodeId) {
        let Some(range) = self.ranges.first().copied() else {
            return;
        };
        if !range.is_collapsed() {
            if let Some(caret) = self.collapse_for_typing(root) {
                let block = self.block_of(caret.node, root);
                if block != root && ranges::is_blank(&self.tree, block) {
                    ranges::fill_blank(&mut self.tree, block);
                    self.set_caret(Position::new(block, 0));
                }
            }
            return;
        }
        let caret = range.start;
        let block = self.block_of(caret.node, root);

        if let Some(text) = self.tree.text(caret.node).map(str::to_string)
            && caret.offset > 0
        {
            self.delete_char_before(caret.node, &text, caret.offset.min(text.chars().count()), block);
            return;
        }

        // a non-empty text node earlier in the same block
        let order = DocumentOrder::new(&self.tree, root);
        if let Some(at) = order.key(&self.tree, caret) {
            let previous = self
                .tree
                .text_nodes(block)
                .into_iter()
                .rev()
                .find(|&t| {
                    order.index(t).is_some_and(|i| i < at.0) && self.tree.node_length(t) > 0
                });
            if let Some(previous) = previous
                && let Some(text) = self.tree.text(previous).map(str::to_string)
            {
                let len = text.chars().count();
                self.delete_char_before(previous, &text, len, block);
                return;
            }
        }

        if block == root {
            return;
        }
        self.join_with_previous(block, root);
    }

    fn delete_char_before(&mut self, node: NodeId, text: &str, offset: usize, block: NodeId) {
        let mut chars: Vec<char> = text.chars().collect();
        chars.remove(offset - 1);
        self.tree.set_text(node, chars.into_iter().collect::<String>());
        if ranges::is_blank(&self.tree, block) {
            ranges::prune_empty_inlines(&mut self.tree, block, &self.blocks);
            ranges::fill_blank(&mut self.tree, block);
            self.set_caret(Position::new(block, 0));
        } else {
            self.set_caret(Position::new(node, offset - 1));
        }
    }

    /// Backspace at the very start of a block.
    fn join_with_previous(&mut self, block: NodeId, root: NodeId) {
        let Some(container) = self.tree.parent(block) else {
            return;
        };

        match self.tree.previous_sibling(block) {
            Some(previous) if self.tree.is_element(previous) && !self.tree.is_tag(previous, "br") => {
                let target = if self.tree.is_tag(previous, "ul") || self.tree.is_tag(previous, "ol") {
                    self.tree.last_child(previous).unwrap_or(previous)
                } else {
                    previous
                };
                ranges::drop_placeholder_break(&mut self.tree, target);
                let caret = ranges::last_caret(&self.tree, target);
                if ranges::is_blank(&self.tree, block) || self.tree.text_content(block).is_empty() {
                    ranges::drop_placeholder_break(&mut self.tree, block);
                }
                self.tree.move_children(block, target);
                self.tree.detach(block);
                ranges::fill_blank(&mut self.tree, target);
                self.set_caret(caret);
            }
            Some(_) => {}
            None if container != root => {
                // first block of a list item or quote leaves its container
                if self.tree.is_tag(block, "li") {
                    self.tree.rename_element(block, "p");
                }
                self.lift(container, block);
                let caret = ranges::first_caret(&self.tree, block);
                self.set_caret(caret);
            }
            None if ranges::is_blank(&self.tree, block)
                || self.tree.text_content(block).is_empty() =>
            {
                let index = self.tree.child_index(block).unwrap_or(0);
                self.tree.detach(block);
                self.set_caret(Position::new(root, index));
            }
            None => {}
        }
    }
}
