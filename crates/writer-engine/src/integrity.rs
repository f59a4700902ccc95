//! Event handlers that keep the editable region in a shape the user can
//! keep typing in.

use log::debug;

use crate::classify::BlockTagSet;
use crate::commands::{BLOCKQUOTE, PARAGRAPH, PREFORMATTED};
use crate::dom::{NodeId, Tree};
use crate::events::{ClipboardData, EventOutcome, Key, KeyInput, TEXT_PLAIN};
use crate::host::EditingHost;

/// Inline elements hosts inject on their own and the region never keeps.
pub const UNWANTED_WRAPPERS: [&str; 2] = ["span", "font"];

/// Containers that handle Enter themselves.
const LIST_TAGS: [&str; 3] = ["li", "ul", "ol"];

/// Key-up repair: loose content directly in the region becomes a paragraph,
/// and so does the block a plain Enter just created outside a list.
pub fn on_key_up<H: EditingHost + ?Sized>(
    host: &mut H,
    region: NodeId,
    blocks: &BlockTagSet,
    key: &KeyInput,
) {
    let Some(start) = start_in_region(host, region) else {
        return;
    };

    let tree = host.document();
    if start == region && !tree.children(region).iter().any(|&c| tree.is_element(c)) {
        debug!("Region holds no blocks, formatting as paragraph");
        host.apply_block_format(PARAGRAPH);
    }

    if key.key == Key::Enter && !key.shift {
        let Some(start) = start_in_region(host, region) else {
            return;
        };
        let tree = host.document();
        let block = blocks.nearest_block_ancestor(tree, start, Some(region));
        let in_list = tree.tag(block).is_some_and(|tag| LIST_TAGS.contains(&tag));
        if !in_list {
            host.apply_block_format(PARAGRAPH);
        }
    }
}

/// Element the live selection starts in, when that is inside the region.
fn start_in_region<H: EditingHost + ?Sized>(host: &H, region: NodeId) -> Option<NodeId> {
    let tree = host.document();
    host.selection()?
        .start_element(tree)
        .filter(|&start| tree.contains(region, start))
}

/// Key-down guard: Backspace may not delete an empty block that is the
/// first, or the only, block of the region.
pub fn on_key_down<H: EditingHost + ?Sized>(
    host: &H,
    region: NodeId,
    blocks: &BlockTagSet,
    key: &KeyInput,
) -> EventOutcome {
    if key.key != Key::Backspace {
        return EventOutcome::Proceed;
    }
    let Some(start) = start_in_region(host, region) else {
        return EventOutcome::Proceed;
    };
    if protects_block(host.document(), region, blocks, start) {
        debug!("Keeping the empty first block of {region}");
        EventOutcome::PreventDefault
    } else {
        EventOutcome::Proceed
    }
}

fn protects_block(tree: &Tree, region: NodeId, blocks: &BlockTagSet, start: NodeId) -> bool {
    let block = blocks.nearest_block_ancestor(tree, start, Some(region));
    if block == region || tree.parent(block) != Some(region) {
        return false;
    }
    if !tree.text_content(block).is_empty() {
        return false;
    }
    let first = tree.previous_sibling(block).is_none();
    let sole = tree
        .children(region)
        .iter()
        .all(|&c| c == block || !tree.is_element(c));
    first || sole
}

/// Paste handler: only the plain-text flavor of the clipboard is inserted.
pub fn on_paste<H: EditingHost + ?Sized>(host: &mut H, data: &ClipboardData) -> EventOutcome {
    match data.get_data(TEXT_PLAIN) {
        Some(text) => host.insert_text(text),
        None => debug!("Clipboard has no plain text, nothing pasted"),
    }
    EventOutcome::PreventDefault
}

/// Unwraps `node` when it is an unwanted wrapper inside the region, keeping
/// its children where it was. Returns whether anything was removed.
pub fn unwrap_inserted_wrapper(tree: &mut Tree, region: NodeId, node: NodeId) -> bool {
    if node == region
        || !tree.has_node(node)
        || !tree.is_attached(node)
        || !tree.contains(region, node)
    {
        return false;
    }
    let Some(tag) = tree
        .tag(node)
        .filter(|tag| UNWANTED_WRAPPERS.contains(tag))
        .map(str::to_string)
    else {
        return false;
    };
    tree.unwrap_element(node);
    debug!("Removed host created <{tag}> element {node}");
    true
}

/// Makes sure every quote and preformatted block in the region is followed
/// by a paragraph, inserting `<p><br></p>` where one is missing. Returns the
/// inserted paragraphs.
pub fn ensure_exit_paragraphs(tree: &mut Tree, region: NodeId) -> Vec<NodeId> {
    let terminals: Vec<NodeId> = tree
        .descendants(region)
        .into_iter()
        .filter(|&n| tree.is_tag(n, BLOCKQUOTE) || tree.is_tag(n, PREFORMATTED))
        .collect();

    let mut inserted = Vec::new();
    for terminal in terminals {
        let mut next = tree.next_sibling(terminal);
        while let Some(n) = next
            && tree.text(n).is_some_and(|t| t.trim().is_empty())
        {
            next = tree.next_sibling(n);
        }
        if next.is_some_and(|n| tree.is_tag(n, PARAGRAPH)) {
            continue;
        }

        let paragraph = tree.create_element(PARAGRAPH);
        let br = tree.create_element("br");
        tree.append_child(paragraph, br);
        tree.insert_after(paragraph, terminal);
        debug!("Inserted exit paragraph after {terminal}");
        inserted.push(paragraph);
    }
    inserted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TEXT_HTML;
    use crate::host::{HostProfile, MemoryHost};
    use crate::selection::Range;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn region_host(html: &str) -> (MemoryHost, NodeId) {
        let host = MemoryHost::from_html(
            &format!("<div contenteditable=\"true\">{html}</div>"),
            HostProfile::default(),
        )
        .unwrap();
        let region = host.document().first_child(host.document().root()).unwrap();
        (host, region)
    }

    fn inner(host: &MemoryHost, region: NodeId) -> String {
        host.document().inner_html(region)
    }

    #[rstest]
    #[case::after_quote("<blockquote>q</blockquote>", "<blockquote>q</blockquote><p><br></p>")]
    #[case::after_pre("<pre>x</pre><h1>t</h1>", "<pre>x</pre><p><br></p><h1>t</h1>")]
    #[case::already_followed("<pre>x</pre><p>y</p>", "<pre>x</pre><p>y</p>")]
    #[case::nothing_terminal("<p>a</p>", "<p>a</p>")]
    fn exit_paragraphs(#[case] html: &str, #[case] expected: &str) {
        let (mut host, region) = region_host(html);

        ensure_exit_paragraphs(host.document_mut(), region);

        assert_eq!(inner(&host, region), expected);
    }

    #[test]
    fn exit_paragraph_skips_whitespace_between_blocks() {
        let (mut host, region) = region_host("<pre>x</pre>\n<p>y</p>");
        assert!(ensure_exit_paragraphs(host.document_mut(), region).is_empty());
    }

    #[test]
    fn span_wrapper_is_unwrapped_in_place() {
        let (mut host, region) = region_host("<p>a<span style=\"x\">b</span>c</p>");
        let span = host
            .document()
            .descendants(region)
            .into_iter()
            .find(|&n| host.document().is_tag(n, "span"))
            .unwrap();

        assert!(unwrap_inserted_wrapper(host.document_mut(), region, span));
        assert_eq!(inner(&host, region), "<p>abc</p>");
    }

    #[test]
    fn wanted_elements_and_outside_nodes_are_kept() {
        let mut host = MemoryHost::from_html(
            "<div contenteditable=\"true\"><p><b>b</b></p></div><span>outside</span>",
            HostProfile::default(),
        )
        .unwrap();
        let tree = host.document();
        let region = tree.first_child(tree.root()).unwrap();
        let bold = tree.descendants(region)[1];
        let outside = tree.children(tree.root())[1];

        assert!(!unwrap_inserted_wrapper(host.document_mut(), region, bold));
        assert!(!unwrap_inserted_wrapper(host.document_mut(), region, outside));
        assert!(!unwrap_inserted_wrapper(host.document_mut(), region, region));
    }

    #[test]
    fn unknown_node_ids_are_ignored() {
        let (mut host, region) = region_host("<p>a</p>");
        let mut other = Tree::new();
        for _ in 0..20 {
            other.create_element("span");
        }
        let foreign = other.create_element("span");

        assert!(!unwrap_inserted_wrapper(host.document_mut(), region, foreign));
        assert_eq!(inner(&host, region), "<p>a</p>");
    }

    #[test]
    fn backspace_is_prevented_in_empty_first_block() {
        let (mut host, region) = region_host("<p><br></p>");
        let p = host.document().children(region)[0];
        host.select(Range::caret(p, 0));

        let outcome = on_key_down(&host, region, &BlockTagSet::default(), &KeyInput::backspace());

        assert_eq!(outcome, EventOutcome::PreventDefault);
    }

    #[test]
    fn backspace_is_prevented_in_sole_empty_block_after_loose_text() {
        let (mut host, region) = region_host(" <p></p>");
        let p = host.document().children(region)[1];
        host.select(Range::caret(p, 0));

        let outcome = on_key_down(&host, region, &BlockTagSet::default(), &KeyInput::backspace());

        assert_eq!(outcome, EventOutcome::PreventDefault);
    }

    #[rstest]
    #[case::has_text("<p>abc</p>", 0)]
    #[case::second_block("<p>a</p><p><br></p>", 1)]
    fn backspace_proceeds(#[case] html: &str, #[case] block: usize) {
        let (mut host, region) = region_host(html);
        let target = host.document().children(region)[block];
        host.select(Range::caret(target, 0));

        let outcome = on_key_down(&host, region, &BlockTagSet::default(), &KeyInput::backspace());

        assert_eq!(outcome, EventOutcome::Proceed);
    }

    #[test]
    fn other_keys_are_not_guarded() {
        let (mut host, region) = region_host("<p><br></p>");
        let p = host.document().children(region)[0];
        host.select(Range::caret(p, 0));

        let outcome = on_key_down(&host, region, &BlockTagSet::default(), &KeyInput::enter());

        assert_eq!(outcome, EventOutcome::Proceed);
    }

    #[test]
    fn paste_inserts_plain_text_only() {
        let (mut host, region) = region_host("<p>x</p>");
        let text = host.document().text_nodes(region)[0];
        host.select(Range::caret(text, 1));
        let data = ClipboardData::plain("<i>y</i>").with(TEXT_HTML, "<b>bold</b>");

        let outcome = on_paste(&mut host, &data);

        assert!(outcome.is_prevented());
        assert_eq!(inner(&host, region), "<p>x&lt;i&gt;y&lt;/i&gt;</p>");
    }

    #[test]
    fn html_only_clipboard_pastes_nothing() {
        let (mut host, region) = region_host("<p>x</p>");
        let text = host.document().text_nodes(region)[0];
        host.select(Range::caret(text, 1));

        let outcome = on_paste(&mut host, &ClipboardData::new().with(TEXT_HTML, "<b>y</b>"));

        assert!(outcome.is_prevented());
        assert_eq!(inner(&host, region), "<p>x</p>");
    }

    #[test]
    fn key_up_wraps_loose_region_content() {
        let (mut host, region) = region_host("typed");
        host.select(Range::caret(region, 1));

        on_key_up(&mut host, region, &BlockTagSet::default(), &KeyInput::char('d'));

        assert_eq!(inner(&host, region), "<p>typed</p>");
    }

    #[test]
    fn enter_turns_new_block_into_paragraph() {
        let (mut host, region) = region_host("<h1>t</h1><div><br></div>");
        let div = host.document().children(region)[1];
        host.select(Range::caret(div, 0));

        on_key_up(&mut host, region, &BlockTagSet::default(), &KeyInput::enter());

        assert_eq!(inner(&host, region), "<h1>t</h1><p><br></p>");
    }

    #[rstest]
    #[case::list_item("<ul><li>a</li><li>b</li></ul>", false)]
    #[case::line_break("<h1>a<br>b</h1>", true)]
    fn enter_keeps_lists_and_line_breaks(#[case] html: &str, #[case] shift: bool) {
        let (mut host, region) = region_host(html);
        let last = *host.document().text_nodes(region).last().unwrap();
        host.select(Range::caret(last, 0));
        let key = if shift {
            KeyInput::with_shift(Key::Enter)
        } else {
            KeyInput::enter()
        };

        on_key_up(&mut host, region, &BlockTagSet::default(), &key);

        assert_eq!(inner(&host, region), html);
    }
}
