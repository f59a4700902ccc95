use std::collections::BTreeMap;

use crate::dom::NodeId;

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Char(char),
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub shift: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn with_shift(key: Key) -> Self {
        Self { key, shift: true }
    }

    pub fn enter() -> Self {
        Self::new(Key::Enter)
    }

    pub fn backspace() -> Self {
        Self::new(Key::Backspace)
    }

    pub fn char(c: char) -> Self {
        Self::new(Key::Char(c))
    }
}

/// Clipboard payload of a paste, keyed by MIME type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardData {
    entries: BTreeMap<String, String>,
}

impl ClipboardData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new().with(TEXT_PLAIN, text)
    }

    pub fn with(mut self, mime: &str, data: impl Into<String>) -> Self {
        self.entries.insert(mime.to_ascii_lowercase(), data.into());
        self
    }

    pub fn get_data(&self, mime: &str) -> Option<&str> {
        self.entries
            .get(&mime.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Input the host delivers to the editor, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// Pointer released anywhere in the host document.
    PointerUp,
    KeyDown(KeyInput),
    KeyUp(KeyInput),
    Blur,
    Paste(ClipboardData),
    /// An element was inserted into the document by someone else.
    NodeInserted(NodeId),
}

/// Whether the host may run its default action for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Proceed,
    PreventDefault,
}

impl EventOutcome {
    pub fn is_prevented(self) -> bool {
        self == EventOutcome::PreventDefault
    }
}
