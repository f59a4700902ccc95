//! DOM-like document model the editor operates on.
//!
//! - **`tree`**: arena tree of element and text nodes with sibling/ancestor navigation
//! - **`html`**: serialization and fragment parsing
//! - **`selector`**: the simple `tag#id.class` selectors used to locate editable regions

pub mod html;
pub mod selector;
pub mod tree;

pub use selector::Selector;
pub use tree::{ElementData, NodeId, NodeKind, Tree};
