use std::sync::OnceLock;

use regex::Regex;

use super::tree::{NodeId, Tree};
use crate::error::DomError;

fn selector_regex() -> &'static Regex {
    static SELECTOR_REGEX: OnceLock<Regex> = OnceLock::new();
    SELECTOR_REGEX.get_or_init(|| {
        Regex::new(
            r"^(?P<tag>[A-Za-z][A-Za-z0-9-]*)?(?:#(?P<id>[A-Za-z_][\w-]*))?(?P<classes>(?:\.[A-Za-z_][\w-]*)*)$",
        )
        .expect("Invalid selector regex")
    })
}

/// A compound selector: optional tag, optional id and any number of classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    pub fn parse(selector: &str) -> Result<Self, DomError> {
        let trimmed = selector.trim();
        let caps = selector_regex()
            .captures(trimmed)
            .filter(|_| !trimmed.is_empty())
            .ok_or_else(|| DomError::InvalidSelector(selector.to_string()))?;

        Ok(Self {
            tag: caps.name("tag").map(|m| m.as_str().to_ascii_lowercase()),
            id: caps.name("id").map(|m| m.as_str().to_string()),
            classes: caps
                .name("classes")
                .map(|m| {
                    m.as_str()
                        .split('.')
                        .filter(|c| !c.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        let Some(tag) = tree.tag(node) else {
            return false;
        };
        self.tag.as_deref().is_none_or(|t| t == tag)
            && self
                .id
                .as_deref()
                .is_none_or(|id| tree.attribute(node, "id") == Some(id))
            && self.classes.iter().all(|c| tree.has_class(node, c))
    }
}

impl Tree {
    /// First attached element matching `selector`, in document order.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, DomError> {
        let selector = Selector::parse(selector)?;
        let root = self.root();
        Ok(std::iter::once(root)
            .chain(self.descendants(root))
            .find(|&n| selector.matches(self, n)))
    }
}
