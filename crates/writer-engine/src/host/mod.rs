//! # Host editing substrate
//!
//! The editor never renders text or moves the caret itself. Everything that
//! a browser's `contenteditable` machinery would do natively is reached
//! through [`EditingHost`]:
//!
//! - the structural tree of the page (`document`)
//! - the live selection (`selection` / `set_selection`)
//! - the native formatting primitives (`apply_inline_style`, `apply_block_format`,
//!   `outdent`, `create_link`, `remove_link`, `insert_text`)
//! - the native reaction to a keystroke the editor did not cancel
//!   (`perform_key_default`)
//!
//! The primitives operate on the live selection and are treated as black
//! boxes with host-specific quirks. [`MemoryHost`] is an in-memory
//! implementation used by tests and the command-line driver; its
//! [`HostProfile`] reproduces the quirks the editor has to repair.

pub mod memory;

pub use memory::{HostProfile, MemoryHost};

use crate::dom::{NodeId, Tree};
use crate::events::KeyInput;
use crate::selection::{Range, Selection};

/// Character-level and list styling commands delegated to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    OrderedList,
    UnorderedList,
}

impl InlineStyle {
    /// Name of the equivalent native editing command.
    pub fn command_name(self) -> &'static str {
        match self {
            InlineStyle::Bold => "bold",
            InlineStyle::Italic => "italic",
            InlineStyle::Underline => "underline",
            InlineStyle::Strikethrough => "strikethrough",
            InlineStyle::Superscript => "superscript",
            InlineStyle::Subscript => "subscript",
            InlineStyle::OrderedList => "insertorderedlist",
            InlineStyle::UnorderedList => "insertunorderedlist",
        }
    }

    /// Element the style is expressed with.
    pub fn tag(self) -> &'static str {
        match self {
            InlineStyle::Bold => "b",
            InlineStyle::Italic => "i",
            InlineStyle::Underline => "u",
            InlineStyle::Strikethrough => "strike",
            InlineStyle::Superscript => "sup",
            InlineStyle::Subscript => "sub",
            InlineStyle::OrderedList => "ol",
            InlineStyle::UnorderedList => "ul",
        }
    }

    pub fn is_list(self) -> bool {
        matches!(self, InlineStyle::OrderedList | InlineStyle::UnorderedList)
    }
}

/// Capabilities the editor needs from the environment it runs in.
pub trait EditingHost {
    fn document(&self) -> &Tree;

    fn document_mut(&mut self) -> &mut Tree;

    /// The live selection, `None` when the host reports no ranges.
    fn selection(&self) -> Option<Selection>;

    /// Drops all current ranges and selects `ranges` instead.
    fn set_selection(&mut self, ranges: &[Range]);

    /// Moves input focus to `node`.
    fn focus(&mut self, node: NodeId);

    /// Toggles a character style (or list) over the live selection.
    fn apply_inline_style(&mut self, style: InlineStyle);

    /// Changes the block enclosing the live selection to `tag`.
    fn apply_block_format(&mut self, tag: &str);

    /// Lifts the block at the live selection out of one level of quoting.
    fn outdent(&mut self);

    fn create_link(&mut self, reference: &str);

    fn remove_link(&mut self);

    /// Replaces the live selection with plain text.
    fn insert_text(&mut self, text: &str);

    /// Runs the host's built-in reaction to a key that was not cancelled.
    fn perform_key_default(&mut self, key: &KeyInput);
}
