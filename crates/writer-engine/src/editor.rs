//! # Editor
//!
//! Owns one editable region of a host document:
//!
//! - **Lifecycle**: marks the region editable, seeds the placeholder paragraph
//! - **Events**: routes host events to the selection tracker and the
//!   integrity handlers, in delivery order
//! - **Commands**: the public formatting API external controls call

use std::fmt;

use log::{debug, info, warn};
use writer_config::{ConfigOverrides, EditorConfig};

use crate::classify::BlockTagSet;
use crate::commands::{self, BlockCommand, PARAGRAPH};
use crate::dom::NodeId;
use crate::error::EditorError;
use crate::events::{ClipboardData, EditorEvent, EventOutcome, KeyInput};
use crate::host::{EditingHost, InlineStyle};
use crate::integrity;
use crate::selection::{Range, SelectionListener, SelectionTracker, StoredSelection};

/// Class added to every region an editor owns.
pub const MARKER_CLASS: &str = "writer-cont";

const EDITABLE_ATTRIBUTE: &str = "contenteditable";

/// Settings passed to [`Editor::create`].
#[derive(Default)]
pub struct EditorOptions {
    pub overrides: ConfigOverrides,
    pub listener: Option<Box<dyn SelectionListener>>,
}

impl EditorOptions {
    pub fn with_listener(mut self, listener: impl SelectionListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }
}

impl fmt::Debug for EditorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorOptions")
            .field("overrides", &self.overrides)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl From<ConfigOverrides> for EditorOptions {
    fn from(overrides: ConfigOverrides) -> Self {
        Self {
            overrides,
            listener: None,
        }
    }
}

impl From<EditorConfig> for EditorOptions {
    fn from(config: EditorConfig) -> Self {
        ConfigOverrides {
            header1: Some(config.header1),
            header2: Some(config.header2),
            placeholder: Some(config.placeholder),
        }
        .into()
    }
}

#[derive(Debug)]
pub struct Editor<H: EditingHost> {
    host: H,
    region: NodeId,
    config: EditorConfig,
    blocks: BlockTagSet,
    tracker: SelectionTracker,
}

impl<H: EditingHost> Editor<H> {
    /// Takes over the first element matching `selector`.
    pub fn create(
        mut host: H,
        selector: &str,
        options: impl Into<EditorOptions>,
    ) -> Result<Self, EditorError> {
        let options = options.into();
        let region = host
            .document()
            .query_selector(selector)?
            .ok_or_else(|| EditorError::NoMatchingElement(selector.to_string()))?;
        let config = options.overrides.apply_to(EditorConfig::default());

        let tree = host.document_mut();
        tree.set_attribute(region, EDITABLE_ATTRIBUTE, "true");
        tree.add_class(region, MARKER_CLASS);
        tree.take_insertions();

        let placeholder = tree.create_element(PARAGRAPH);
        let text = tree.create_text(config.placeholder.as_str());
        tree.append_child(placeholder, text);
        tree.append_child(region, placeholder);
        host.focus(placeholder);

        info!("Editor created on {selector:?} ({region})");
        let mut editor = Self {
            host,
            region,
            config,
            blocks: BlockTagSet::default(),
            tracker: SelectionTracker::new(options.listener),
        };
        editor.flush_insertions();
        Ok(editor)
    }

    /// Delivers one host event. Handlers run to completion, in order.
    pub fn handle_event(&mut self, event: EditorEvent) -> EventOutcome {
        let outcome = match event {
            EditorEvent::PointerUp | EditorEvent::Blur => {
                self.capture_selection();
                EventOutcome::Proceed
            }
            EditorEvent::KeyDown(key) => {
                integrity::on_key_down(&self.host, self.region, &self.blocks, &key)
            }
            EditorEvent::KeyUp(key) => {
                integrity::on_key_up(&mut self.host, self.region, &self.blocks, &key);
                self.capture_selection();
                EventOutcome::Proceed
            }
            EditorEvent::Paste(data) => integrity::on_paste(&mut self.host, &data),
            EditorEvent::NodeInserted(node) => {
                integrity::unwrap_inserted_wrapper(self.host.document_mut(), self.region, node);
                EventOutcome::Proceed
            }
        };
        self.flush_insertions();
        outcome
    }

    /// Presses a key: key-down, the host's default action unless the editor
    /// prevented it, then key-up.
    pub fn press_key(&mut self, key: KeyInput) -> EventOutcome {
        let outcome = self.handle_event(EditorEvent::KeyDown(key.clone()));
        if !outcome.is_prevented() {
            self.host.perform_key_default(&key);
            self.flush_insertions();
        }
        self.handle_event(EditorEvent::KeyUp(key));
        outcome
    }

    /// Types text one character at a time.
    pub fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press_key(KeyInput::char(c));
        }
    }

    pub fn paste(&mut self, data: ClipboardData) -> EventOutcome {
        self.handle_event(EditorEvent::Paste(data))
    }

    pub fn pointer_up(&mut self) {
        self.handle_event(EditorEvent::PointerUp);
    }

    pub fn blur(&mut self) {
        self.handle_event(EditorEvent::Blur);
    }

    fn capture_selection(&mut self) {
        let editable = self.is_enabled();
        if self.tracker.capture(&self.host, editable) {
            debug!("Stored selection: {}", self.tracker.stored());
        }
    }

    /// Runs the wrapper repair over everything inserted since the last flush.
    fn flush_insertions(&mut self) {
        loop {
            let inserted = self.host.document_mut().take_insertions();
            if inserted.is_empty() {
                return;
            }
            for node in inserted {
                integrity::unwrap_inserted_wrapper(self.host.document_mut(), self.region, node);
            }
        }
    }

    fn inline(&mut self, style: InlineStyle) {
        debug!("Applying {}", style.command_name());
        self.host.apply_inline_style(style);
        self.flush_insertions();
    }

    fn block(&mut self, command: BlockCommand) -> Result<(), EditorError> {
        if !self.is_enabled() {
            warn!("Ignoring {command:?}: region is disabled");
            return Err(EditorError::RegionDisabled);
        }
        let result = commands::execute_block_format(
            &mut self.host,
            self.region,
            self.tracker.stored(),
            &self.blocks,
            command,
            &self.config,
        );
        self.flush_insertions();
        result
    }

    pub fn execute_bold(&mut self) {
        self.inline(InlineStyle::Bold);
    }

    pub fn execute_italic(&mut self) {
        self.inline(InlineStyle::Italic);
    }

    pub fn execute_underline(&mut self) {
        self.inline(InlineStyle::Underline);
    }

    pub fn execute_strikethrough(&mut self) {
        self.inline(InlineStyle::Strikethrough);
    }

    pub fn execute_ordered_list(&mut self) {
        self.inline(InlineStyle::OrderedList);
    }

    pub fn execute_unordered_list(&mut self) {
        self.inline(InlineStyle::UnorderedList);
    }

    pub fn execute_superscript(&mut self) {
        self.inline(InlineStyle::Superscript);
    }

    pub fn execute_subscript(&mut self) {
        self.inline(InlineStyle::Subscript);
    }

    pub fn execute_header1(&mut self) -> Result<(), EditorError> {
        self.block(BlockCommand::Header1)
    }

    pub fn execute_header2(&mut self) -> Result<(), EditorError> {
        self.block(BlockCommand::Header2)
    }

    pub fn execute_blockquote(&mut self) -> Result<(), EditorError> {
        self.block(BlockCommand::Blockquote)
    }

    pub fn execute_preformatted(&mut self) -> Result<(), EditorError> {
        self.block(BlockCommand::Preformatted)
    }

    /// Links the live selection to `reference`. Restore a saved selection
    /// first when the reference came from a focus-stealing prompt.
    pub fn execute_link(&mut self, reference: &str) {
        self.host.create_link(reference);
        self.flush_insertions();
    }

    pub fn execute_unlink(&mut self) {
        self.host.remove_link();
        self.flush_insertions();
    }

    /// The last selection captured from the host.
    pub fn selection_node(&self) -> &StoredSelection {
        self.tracker.stored()
    }

    /// The host's live ranges, `None` when it has no selection.
    pub fn selection_ranges(&self) -> Option<Vec<Range>> {
        self.host.selection().map(|s| s.ranges().to_vec())
    }

    pub fn restore_selection_ranges(&mut self, ranges: &[Range]) {
        self.host.set_selection(ranges);
    }

    /// Whether the stored selection sits inside a link.
    pub fn selection_in_link(&self) -> bool {
        let Some(anchor) = self.tracker.stored().anchor_node else {
            return false;
        };
        let tree = self.host.document();
        std::iter::once(anchor)
            .chain(tree.ancestors(anchor))
            .take_while(|&n| n != self.region)
            .any(|n| tree.is_tag(n, "a"))
    }

    pub fn enable(&mut self) {
        self.host
            .document_mut()
            .set_attribute(self.region, EDITABLE_ATTRIBUTE, "true");
    }

    pub fn disable(&mut self) {
        self.host
            .document_mut()
            .set_attribute(self.region, EDITABLE_ATTRIBUTE, "false");
    }

    pub fn is_enabled(&self) -> bool {
        self.host.document().attribute(self.region, EDITABLE_ATTRIBUTE) == Some("true")
    }

    pub fn focus(&mut self) {
        self.host.focus(self.region);
    }

    pub fn region(&self) -> NodeId {
        self.region
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Serialized content of the region.
    pub fn html(&self) -> String {
        self.host.document().inner_html(self.region)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}
