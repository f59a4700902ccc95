pub mod classify;
pub mod commands;
pub mod dom;
pub mod editor;
pub mod error;
pub mod events;
pub mod host;
pub mod integrity;
pub mod selection;

// Re-export key types for easier usage
pub use classify::{BlockTagSet, NodeAncestry};
pub use commands::{BlockCommand, BlockPlan};
pub use dom::{NodeId, Tree};
pub use editor::{Editor, EditorOptions, MARKER_CLASS};
pub use error::{DomError, EditorError};
pub use events::{ClipboardData, EditorEvent, EventOutcome, Key, KeyInput};
pub use host::{EditingHost, HostProfile, InlineStyle, MemoryHost};
pub use selection::{Position, Range, Selection, SelectionListener, StoredSelection};
pub use writer_config::{ConfigOverrides, EditorConfig, HeadingTag};
