//! HTML serialization and fragment parsing for [`Tree`].
//!
//! The parser accepts the well-formed subset the editor itself produces:
//! double-quoted attributes, `br` as the only void element, comments skipped.

use std::sync::OnceLock;

use regex::Regex;

use super::tree::{NodeId, NodeKind, Tree};
use crate::error::DomError;

const VOID_ELEMENTS: [&str; 3] = ["br", "hr", "img"];

fn tag_regex() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| {
        Regex::new(
            r#"<!--[\s\S]*?-->|<(/?)([A-Za-z][A-Za-z0-9]*)((?:\s+[A-Za-z_:][-A-Za-z0-9_:.]*(?:\s*=\s*"[^"]*")?)*)\s*(/?)>"#,
        )
        .expect("Invalid tag regex")
    })
}

fn attribute_regex() -> &'static Regex {
    static ATTRIBUTE_REGEX: OnceLock<Regex> = OnceLock::new();
    ATTRIBUTE_REGEX.get_or_init(|| {
        Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*"([^"]*)")?"#)
            .expect("Invalid attribute regex")
    })
}

impl Tree {
    /// Serializes a node and its subtree.
    ///
    /// Classes are written first as a `class` attribute, the remaining
    /// attributes follow in name order.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    /// Serializes the children of a node.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text(text) => out.push_str(&html_escape::encode_text(text)),
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                if !el.classes.is_empty() {
                    out.push_str(" class=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(
                        &el.classes.join(" "),
                    ));
                    out.push('"');
                }
                for (name, value) in &el.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }

    /// Parses an HTML fragment into detached nodes, returning the top-level ones.
    pub fn parse_fragment(&mut self, html: &str) -> Result<Vec<NodeId>, DomError> {
        // the holder collects top-level nodes; they are detached before returning
        let holder = self.create_element("template");
        let mut stack = vec![holder];
        let mut cursor = 0;

        for caps in tag_regex().captures_iter(html) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let current = stack.last().copied().unwrap_or(holder);
            self.push_text(current, &html[cursor..whole.start()]);
            cursor = whole.end();

            let Some(name) = caps.get(2) else {
                // comment
                continue;
            };
            let tag = name.as_str().to_ascii_lowercase();
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());

            if closing {
                match stack.pop() {
                    Some(open) if open != holder && self.is_tag(open, &tag) => {}
                    _ => {
                        return Err(DomError::MalformedHtml(format!(
                            "unexpected closing tag </{tag}>"
                        )));
                    }
                }
                continue;
            }

            let element = self.create_element(&tag);
            if let Some(attrs) = caps.get(3) {
                for attr in attribute_regex().captures_iter(attrs.as_str()) {
                    let name = attr.get(1).map_or("", |m| m.as_str());
                    let value = attr.get(2).map_or("", |m| m.as_str());
                    self.set_attribute(
                        element,
                        name,
                        html_escape::decode_html_entities(value).into_owned(),
                    );
                }
            }
            self.append_child(current, element);

            let self_closing = caps.get(4).is_some_and(|m| !m.as_str().is_empty());
            if !self_closing && !VOID_ELEMENTS.contains(&tag.as_str()) {
                stack.push(element);
            }
        }

        let current = stack.last().copied().unwrap_or(holder);
        self.push_text(current, &html[cursor..]);

        if stack.len() > 1 {
            let unclosed = stack
                .last()
                .and_then(|&n| self.tag(n))
                .unwrap_or_default()
                .to_string();
            return Err(DomError::MalformedHtml(format!("unclosed tag <{unclosed}>")));
        }

        let nodes = self.children(holder).to_vec();
        for &node in &nodes {
            self.detach(node);
        }
        Ok(nodes)
    }

    /// Replaces the children of `parent` with the parsed fragment.
    pub fn set_inner_html(&mut self, parent: NodeId, html: &str) -> Result<(), DomError> {
        let nodes = self.parse_fragment(html)?;
        for child in self.children(parent).to_vec() {
            self.detach(child);
        }
        for node in nodes {
            self.append_child(parent, node);
        }
        Ok(())
    }

    fn push_text(&mut self, parent: NodeId, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let text = self.create_text(html_escape::decode_html_entities(raw).into_owned());
        self.append_child(parent, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("<p>Start writing here!</p>")]
    #[case("<blockquote><p>x</p></blockquote><p><br></p>")]
    #[case("<ul><li>one</li><li><b>two</b></li></ul>")]
    #[case("<p>a &amp; b &lt;c&gt;</p>")]
    #[case("<p><a href=\"http://example.com/?a=1&amp;b=2\">link</a></p>")]
    #[case("plain text only")]
    fn parse_then_serialize_is_stable(#[case] html: &str) {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.set_inner_html(root, html).unwrap();
        assert_eq!(tree.inner_html(root), html);
    }

    #[test]
    fn classes_come_before_other_attributes() {
        let mut tree = Tree::new();
        let div = tree.create_element("div");
        tree.set_attribute(div, "contenteditable", "true");
        tree.add_class(div, "editor");
        tree.add_class(div, "writer-cont");
        assert_eq!(
            tree.to_html(div),
            "<div class=\"editor writer-cont\" contenteditable=\"true\"></div>"
        );
    }

    #[test]
    fn parses_attributes_and_entities() {
        let mut tree = Tree::new();
        let nodes = tree
            .parse_fragment("<div id=\"main\" class=\"editor big\">&quot;hi&quot;</div>")
            .unwrap();
        assert_eq!(nodes.len(), 1);
        let div = nodes[0];
        assert_eq!(tree.attribute(div, "id"), Some("main"));
        assert!(tree.has_class(div, "big"));
        assert_eq!(tree.text_content(div), "\"hi\"");
        assert_eq!(tree.parent(div), None);
    }

    #[test]
    fn comments_are_skipped_and_tags_lower_cased() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.set_inner_html(root, "<P>a<!-- note --><BR/>b</P>").unwrap();
        assert_eq!(tree.inner_html(root), "<p>a<br>b</p>");
    }

    #[test]
    fn mismatched_tags_are_rejected() {
        let mut tree = Tree::new();
        assert!(matches!(
            tree.parse_fragment("<p><b>x</p></b>"),
            Err(DomError::MalformedHtml(_))
        ));
        assert!(matches!(
            tree.parse_fragment("<p>x"),
            Err(DomError::MalformedHtml(_))
        ));
        assert!(matches!(
            tree.parse_fragment("x</p>"),
            Err(DomError::MalformedHtml(_))
        ));
    }
}
