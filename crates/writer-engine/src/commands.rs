//! # Format commands
//!
//! Inline styles and links go straight to the host primitive. Block commands
//! are planned against the stored selection first:
//!
//! - **Quote escape**: blockquote requested inside a blockquote outdents and stops
//! - **Quote guard**: any other block inside a blockquote is outdented first
//! - **Toggle**: requesting the tag the block already has turns it back into `p`
//! - **Exit paragraph**: quotes and preformatted blocks get a paragraph after them

use log::{debug, warn};
use writer_config::EditorConfig;

use crate::classify::BlockTagSet;
use crate::dom::{NodeId, Tree};
use crate::error::EditorError;
use crate::host::EditingHost;
use crate::integrity;
use crate::selection::StoredSelection;

pub const PARAGRAPH: &str = "p";
pub const BLOCKQUOTE: &str = "blockquote";
pub const PREFORMATTED: &str = "pre";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockCommand {
    Header1,
    Header2,
    Blockquote,
    Preformatted,
}

impl BlockCommand {
    pub fn tag(self, config: &EditorConfig) -> &'static str {
        match self {
            BlockCommand::Header1 => config.header1.as_str(),
            BlockCommand::Header2 => config.header2.as_str(),
            BlockCommand::Blockquote => BLOCKQUOTE,
            BlockCommand::Preformatted => PREFORMATTED,
        }
    }

    /// Blocks the caret cannot leave by typing, which need a paragraph after them.
    pub fn is_terminal(self) -> bool {
        matches!(self, BlockCommand::Blockquote | BlockCommand::Preformatted)
    }
}

/// What a block command does to the host, decided before touching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPlan {
    pub outdent: bool,
    /// Tag handed to the format-block primitive; `None` on the quote escape path.
    pub format: Option<String>,
}

/// Plans a block command for the block `target`.
pub fn plan_block_format(tree: &Tree, target: NodeId, requested: &str) -> BlockPlan {
    let in_quote = tree
        .parent(target)
        .is_some_and(|parent| tree.is_tag(parent, BLOCKQUOTE));

    if in_quote && requested == BLOCKQUOTE {
        return BlockPlan {
            outdent: true,
            format: None,
        };
    }

    let format = if tree.is_tag(target, requested) {
        PARAGRAPH
    } else {
        requested
    };
    BlockPlan {
        outdent: in_quote,
        format: Some(format.to_string()),
    }
}

/// Resolves the block the stored selection anchors in.
pub fn target_block(
    tree: &Tree,
    region: NodeId,
    stored: &StoredSelection,
    blocks: &BlockTagSet,
) -> Result<NodeId, EditorError> {
    let anchor = stored.anchor_node.ok_or(EditorError::NoActiveSelection)?;
    if !tree.contains(region, anchor) {
        return Err(EditorError::SelectionOutsideRegion(anchor));
    }
    Ok(blocks.nearest_block_ancestor(tree, anchor, Some(region)))
}

/// Runs a block command against the host.
///
/// The live selection is left alone when the host still has one; otherwise
/// the stored range is put back first so the primitive has something to act on.
pub fn execute_block_format<H: EditingHost + ?Sized>(
    host: &mut H,
    region: NodeId,
    stored: &StoredSelection,
    blocks: &BlockTagSet,
    command: BlockCommand,
    config: &EditorConfig,
) -> Result<(), EditorError> {
    let target = match target_block(host.document(), region, stored, blocks) {
        Ok(target) => target,
        Err(err) => {
            warn!("Ignoring {command:?}: {err}");
            return Err(err);
        }
    };

    let plan = plan_block_format(host.document(), target, command.tag(config));
    debug!("{command:?} on {target}: {plan:?}");

    if host.selection().is_none()
        && let Some(range) = stored.primary_range
    {
        host.set_selection(&[range]);
    }

    if plan.outdent {
        host.outdent();
    }
    let Some(format) = plan.format else {
        return Ok(());
    };
    let version = host.document().version();
    host.apply_block_format(&format);
    if host.document().version() == version {
        debug!("Host left the region unchanged, skipping repairs");
        return Ok(());
    }

    if command.is_terminal() {
        integrity::ensure_exit_paragraphs(host.document_mut(), region);
    }
    Ok(())
}
