use super::MemoryHost;
use super::ranges;
use crate::dom::NodeId;
use crate::selection::Position;

/// Style attribute the chromium profile puts on the spans it injects.
const INJECTED_SPAN_STYLE: &str = "line-height: 1.5;";

impl MemoryHost {
    /// Nearest ancestor of `node` with `tag`, not looking past `root`.
    fn ancestor_tagged(&self, node: NodeId, tag: &str, root: NodeId) -> Option<NodeId> {
        std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .take_while(|&n| n != root)
            .find(|&n| self.tree.is_tag(n, tag))
    }

    /// Wraps the selected text in `tag`, or unwraps it when all of it is
    /// already inside such an element.
    pub(super) fn toggle_inline(&mut self, tag: &str) {
        let Some((range, root)) = self.active() else {
            return;
        };
        if range.is_collapsed() {
            return;
        }
        let segments = ranges::isolate_text(&mut self.tree, root, range);
        if segments.is_empty() {
            return;
        }

        let styled: Vec<Option<NodeId>> = segments
            .iter()
            .map(|&s| self.ancestor_tagged(s, tag, root))
            .collect();

        if styled.iter().all(Option::is_some) {
            let mut unwrapped = Vec::new();
            for element in styled.into_iter().flatten() {
                if !unwrapped.contains(&element) {
                    self.tree.unwrap_element(element);
                    unwrapped.push(element);
                }
            }
        } else {
            for (&segment, style) in segments.iter().zip(styled) {
                if style.is_none() {
                    let wrapper = self.tree.create_element(tag);
                    self.tree.wrap(segment, wrapper);
                }
            }
        }

        if let Some(selected) = ranges::span_range(&self.tree, &segments) {
            self.ranges = vec![selected];
        }
    }

    pub(super) fn link(&mut self, reference: &str) {
        if reference.is_empty() {
            return;
        }
        let Some((range, root)) = self.active() else {
            return;
        };

        if range.is_collapsed() {
            let anchor = self.tree.create_element("a");
            self.tree.set_attribute(anchor, "href", reference);
            let text = self.tree.create_text(reference);
            self.tree.append_child(anchor, text);
            if let Some(after) = ranges::insert_at(&mut self.tree, range.start, anchor) {
                self.set_caret(after);
            }
            return;
        }

        let segments = ranges::isolate_text(&mut self.tree, root, range);
        for &segment in &segments {
            match self.ancestor_tagged(segment, "a", root) {
                Some(existing) => self.tree.set_attribute(existing, "href", reference),
                None => {
                    let anchor = self.tree.create_element("a");
                    self.tree.set_attribute(anchor, "href", reference);
                    self.tree.wrap(segment, anchor);
                }
            }
        }
        if let Some(selected) = ranges::span_range(&self.tree, &segments) {
            self.ranges = vec![selected];
        }
    }

    pub(super) fn unlink(&mut self) {
        let Some((range, root)) = self.active() else {
            return;
        };
        let nodes = if range.is_collapsed() {
            vec![range.start.node]
        } else {
            ranges::touched_text(&self.tree, root, range)
        };

        let mut anchors: Vec<NodeId> = Vec::new();
        for node in nodes {
            if let Some(anchor) = self.ancestor_tagged(node, "a", root)
                && !anchors.contains(&anchor)
            {
                anchors.push(anchor);
            }
        }
        for anchor in anchors {
            self.tree.unwrap_element(anchor);
        }
    }

    pub(super) fn insert_plain_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let Some((range, root)) = self.active() else {
            return;
        };
        let caret = if range.is_collapsed() {
            range.start
        } else {
            match ranges::delete_contents(&mut self.tree, root, range, &self.blocks) {
                Some(caret) => caret,
                None => range.start,
            }
        };

        if self.profile.wrap_inserted_text {
            let span = self.tree.create_element("span");
            self.tree.set_attribute(span, "style", INJECTED_SPAN_STYLE);
            let inserted = self.tree.create_text(text);
            self.tree.append_child(span, inserted);
            self.insert_node(caret, span);
            self.set_caret(Position::new(inserted, self.tree.node_length(inserted)));
            return;
        }

        if let Some(existing) = self.tree.text(caret.node).map(str::to_string) {
            let at = crate::dom::tree::byte_index(&existing, caret.offset);
            let mut updated = existing;
            updated.insert_str(at, text);
            self.tree.set_text(caret.node, updated);
            self.set_caret(Position::new(
                caret.node,
                caret.offset + text.chars().count(),
            ));
            return;
        }

        let inserted = self.tree.create_text(text);
        self.insert_node(caret, inserted);
        self.set_caret(Position::new(inserted, self.tree.node_length(inserted)));
    }

    /// Inserts a node at a caret, replacing a lone `<br>` placeholder when
    /// the caret sits in an empty element.
    pub(super) fn insert_node(&mut self, caret: Position, node: NodeId) {
        let caret = if self.tree.is_element(caret.node)
            && ranges::drop_placeholder_break(&mut self.tree, caret.node)
        {
            Position::new(caret.node, 0)
        } else {
            caret
        };
        ranges::insert_at(&mut self.tree, caret, node);
    }
}

#[cfg(test)]
mod tests {
    use super::super::HostProfile;
    use super::super::tests::{editable, text_node};
    use crate::host::{EditingHost, InlineStyle};
    use crate::selection::{Position, Range};
    use pretty_assertions::assert_eq;

    fn select(host: &mut super::MemoryHost, text: crate::dom::NodeId, from: usize, to: usize) {
        host.select(Range::new(Position::new(text, from), Position::new(text, to)));
    }

    #[test]
    fn bold_wraps_then_unwraps_selection() {
        let (mut host, region) = editable("<p>hello world</p>", HostProfile::default());
        let text = text_node(&host, region, 0);
        select(&mut host, text, 6, 11);

        host.apply_inline_style(InlineStyle::Bold);
        assert_eq!(host.tree.inner_html(region), "<p>hello <b>world</b></p>");

        host.apply_inline_style(InlineStyle::Bold);
        assert_eq!(host.tree.inner_html(region), "<p>hello world</p>");
    }

    #[test]
    fn styles_use_their_own_elements() {
        let (mut host, region) = editable("<p>abc</p>", HostProfile::default());
        let text = text_node(&host, region, 0);
        select(&mut host, text, 0, 3);

        host.apply_inline_style(InlineStyle::Strikethrough);
        host.apply_inline_style(InlineStyle::Superscript);

        assert_eq!(host.tree.inner_html(region), "<p><strike><sup>abc</sup></strike></p>");
    }

    #[test]
    fn collapsed_selection_is_not_styled() {
        let (mut host, region) = editable("<p>abc</p>", HostProfile::default());
        host.apply_inline_style(InlineStyle::Italic);
        assert_eq!(host.tree.inner_html(region), "<p>abc</p>");
    }

    #[test]
    fn link_wraps_selection_and_unlink_removes_it() {
        let (mut host, region) = editable("<p>see docs here</p>", HostProfile::default());
        let text = text_node(&host, region, 0);
        select(&mut host, text, 4, 8);

        host.create_link("http://example.com");
        assert_eq!(
            host.tree.inner_html(region),
            "<p>see <a href=\"http://example.com\">docs</a> here</p>"
        );

        host.remove_link();
        assert_eq!(host.tree.inner_html(region), "<p>see docs here</p>");
    }

    #[test]
    fn link_at_caret_inserts_reference_text() {
        let (mut host, region) = editable("<p>go </p>", HostProfile::default());
        let text = text_node(&host, region, 0);
        host.select(Range::caret(text, 3));

        host.create_link("http://x.org");

        assert_eq!(
            host.tree.inner_html(region),
            "<p>go <a href=\"http://x.org\">http://x.org</a></p>"
        );
    }

    #[test]
    fn empty_reference_is_ignored() {
        let (mut host, region) = editable("<p>abc</p>", HostProfile::default());
        let text = text_node(&host, region, 0);
        select(&mut host, text, 0, 3);
        host.create_link("");
        assert_eq!(host.tree.inner_html(region), "<p>abc</p>");
    }

    #[test]
    fn insert_text_replaces_selection() {
        let (mut host, region) = editable("<p>hello world</p>", HostProfile::default());
        let text = text_node(&host, region, 0);
        select(&mut host, text, 6, 11);

        host.insert_text("there");

        assert_eq!(host.tree.text_content(region), "hello there");
        assert_eq!(host.tree.inner_html(region), "<p>hello there</p>");
    }

    #[test]
    fn insert_text_escapes_markup() {
        let (mut host, region) = editable("<p>x</p>", HostProfile::default());
        let text = text_node(&host, region, 0);
        host.select(Range::caret(text, 1));

        host.insert_text("<b>y</b>");

        assert_eq!(host.tree.inner_html(region), "<p>x&lt;b&gt;y&lt;/b&gt;</p>");
    }

    #[test]
    fn insert_text_replaces_placeholder_break() {
        let (mut host, region) = editable("<p><br></p>", HostProfile::default());
        let p = host.tree.children(region)[0];
        host.select(Range::caret(p, 0));

        host.insert_text("a");

        assert_eq!(host.tree.inner_html(region), "<p>a</p>");
    }

    #[test]
    fn chromium_profile_wraps_inserted_text_in_span() {
        let (mut host, region) = editable("<p>x</p>", HostProfile::chromium());
        let text = text_node(&host, region, 0);
        host.select(Range::caret(text, 1));

        host.insert_text("y");

        assert_eq!(
            host.tree.inner_html(region),
            "<p>x<span style=\"line-height: 1.5;\">y</span></p>"
        );
    }
}
