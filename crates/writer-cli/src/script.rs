//! Line-oriented editing scripts.
//!
//! Each line is one command; `#` starts a comment. Node paths are child
//! indexes relative to the editable region, `0/1` being the second child of
//! its first child.

use std::io::Write;

use anyhow::{Context, Result, anyhow, bail};
use writer_engine::events::TEXT_HTML;
use writer_engine::{
    BlockCommand, ClipboardData, EditingHost, Editor, InlineStyle, Key, KeyInput, MemoryHost,
    NodeId, Position, Range, Tree,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select {
        start: (Vec<usize>, usize),
        end: Option<(Vec<usize>, usize)>,
    },
    Click,
    Type(String),
    Key(KeyInput),
    Paste(String),
    PasteHtml(String),
    Inline(InlineStyle),
    Block(BlockCommand),
    Link(String),
    Unlink,
    ToggleLink(String),
    SaveSelection,
    RestoreSelection,
    Enable,
    Disable,
    Print,
}

fn parse_path(path: &str) -> Result<Vec<usize>> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .with_context(|| format!("invalid path segment {s:?} in {path:?}"))
        })
        .collect()
}

fn parse_point(path: Option<&str>, offset: Option<&str>) -> Result<(Vec<usize>, usize)> {
    let path = path.ok_or_else(|| anyhow!("select needs a path and an offset"))?;
    let offset = offset.ok_or_else(|| anyhow!("select needs an offset after {path:?}"))?;
    let offset = offset
        .parse()
        .with_context(|| format!("invalid offset {offset:?}"))?;
    Ok((parse_path(path)?, offset))
}

fn required(argument: &str, command: &str) -> Result<String> {
    if argument.is_empty() {
        bail!("{command} needs an argument");
    }
    Ok(argument.to_string())
}

/// Parses one script line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.trim_start();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (name, argument) = line.split_once(' ').unwrap_or((line, ""));
    let argument = argument.trim_end_matches(['\r', '\n']);

    let command = match name {
        "select" => {
            let mut parts = argument.split_whitespace();
            let start = parse_point(parts.next(), parts.next())?;
            let end = match parts.next() {
                Some(path) => Some(parse_point(Some(path), parts.next())?),
                None => None,
            };
            Command::Select { start, end }
        }
        "click" => Command::Click,
        "type" => Command::Type(required(argument, name)?),
        "key" => Command::Key(match argument.trim() {
            "enter" => KeyInput::enter(),
            "shift-enter" => KeyInput::with_shift(Key::Enter),
            "backspace" => KeyInput::backspace(),
            other => bail!("unknown key {other:?}"),
        }),
        "paste" => Command::Paste(argument.to_string()),
        "paste-html" => Command::PasteHtml(argument.to_string()),
        "bold" => Command::Inline(InlineStyle::Bold),
        "italic" => Command::Inline(InlineStyle::Italic),
        "underline" => Command::Inline(InlineStyle::Underline),
        "strike" => Command::Inline(InlineStyle::Strikethrough),
        "sup" => Command::Inline(InlineStyle::Superscript),
        "sub" => Command::Inline(InlineStyle::Subscript),
        "ol" => Command::Inline(InlineStyle::OrderedList),
        "ul" => Command::Inline(InlineStyle::UnorderedList),
        "h1" => Command::Block(BlockCommand::Header1),
        "h2" => Command::Block(BlockCommand::Header2),
        "quote" => Command::Block(BlockCommand::Blockquote),
        "pre" => Command::Block(BlockCommand::Preformatted),
        "link" => Command::Link(required(argument.trim(), name)?),
        "unlink" => Command::Unlink,
        "toggle-link" => Command::ToggleLink(required(argument.trim(), name)?),
        "save-selection" => Command::SaveSelection,
        "restore-selection" => Command::RestoreSelection,
        "enable" => Command::Enable,
        "disable" => Command::Disable,
        "print" => Command::Print,
        other => bail!("unknown command {other:?}"),
    };
    Ok(Some(command))
}

/// Plain text a browser would put next to `html` on the clipboard.
fn plain_text_of(html: &str) -> Result<String> {
    let mut scratch = Tree::new();
    let nodes = scratch.parse_fragment(html)?;
    Ok(nodes.into_iter().map(|n| scratch.text_content(n)).collect())
}

pub struct ScriptRunner<W: Write> {
    editor: Editor<MemoryHost>,
    saved: Option<Vec<Range>>,
    out: W,
}

impl<W: Write> ScriptRunner<W> {
    pub fn new(editor: Editor<MemoryHost>, out: W) -> Self {
        Self {
            editor,
            saved: None,
            out,
        }
    }

    pub fn editor(&self) -> &Editor<MemoryHost> {
        &self.editor
    }

    /// Runs every line, stopping at the first failing one.
    pub fn run(&mut self, script: &str) -> Result<()> {
        for (index, line) in script.lines().enumerate() {
            let number = index + 1;
            let command = parse_line(line).with_context(|| format!("line {number}"))?;
            if let Some(command) = command {
                self.execute(command)
                    .with_context(|| format!("line {number}: {}", line.trim()))?;
            }
        }
        Ok(())
    }

    fn resolve(&self, path: &[usize]) -> Result<NodeId> {
        let tree = self.editor.host().document();
        path.iter().try_fold(self.editor.region(), |node, &i| {
            tree.children(node)
                .get(i)
                .copied()
                .ok_or_else(|| anyhow!("no child {i} under {node}"))
        })
    }

    fn point(&self, (path, offset): &(Vec<usize>, usize)) -> Result<Position> {
        Ok(Position::new(self.resolve(path)?, *offset))
    }

    pub fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Select { start, end } => {
                let start = self.point(&start)?;
                let end = match end {
                    Some(end) => self.point(&end)?,
                    None => start,
                };
                self.editor.restore_selection_ranges(&[Range::new(start, end)]);
                self.editor.pointer_up();
            }
            Command::Click => self.editor.pointer_up(),
            Command::Type(text) => self.editor.type_text(&text),
            Command::Key(key) => {
                if self.editor.press_key(key).is_prevented() {
                    log::info!("Key was blocked by the editor");
                }
            }
            Command::Paste(text) => {
                self.editor.paste(ClipboardData::plain(text));
            }
            Command::PasteHtml(html) => {
                let data = ClipboardData::plain(plain_text_of(&html)?).with(TEXT_HTML, html);
                self.editor.paste(data);
            }
            Command::Inline(style) => match style {
                InlineStyle::Bold => self.editor.execute_bold(),
                InlineStyle::Italic => self.editor.execute_italic(),
                InlineStyle::Underline => self.editor.execute_underline(),
                InlineStyle::Strikethrough => self.editor.execute_strikethrough(),
                InlineStyle::Superscript => self.editor.execute_superscript(),
                InlineStyle::Subscript => self.editor.execute_subscript(),
                InlineStyle::OrderedList => self.editor.execute_ordered_list(),
                InlineStyle::UnorderedList => self.editor.execute_unordered_list(),
            },
            Command::Block(block) => {
                let result = match block {
                    BlockCommand::Header1 => self.editor.execute_header1(),
                    BlockCommand::Header2 => self.editor.execute_header2(),
                    BlockCommand::Blockquote => self.editor.execute_blockquote(),
                    BlockCommand::Preformatted => self.editor.execute_preformatted(),
                };
                if let Err(e) = result {
                    log::warn!("{block:?} skipped: {e}");
                }
            }
            Command::Link(reference) => self.editor.execute_link(&reference),
            Command::Unlink => self.editor.execute_unlink(),
            Command::ToggleLink(reference) => {
                if self.editor.selection_in_link() {
                    self.editor.execute_unlink();
                } else {
                    self.editor.execute_link(&reference);
                }
            }
            Command::SaveSelection => self.saved = self.editor.selection_ranges(),
            Command::RestoreSelection => {
                let ranges = self
                    .saved
                    .as_deref()
                    .ok_or_else(|| anyhow!("no saved selection"))?;
                self.editor.restore_selection_ranges(ranges);
            }
            Command::Enable => self.editor.enable(),
            Command::Disable => self.editor.disable(),
            Command::Print => writeln!(self.out, "{}", self.editor.html())?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use writer_engine::{EditorOptions, HostProfile};

    fn runner() -> ScriptRunner<Vec<u8>> {
        let host =
            MemoryHost::from_html("<div class=\"editor\"></div>", HostProfile::default()).unwrap();
        let editor = Editor::create(host, ".editor", EditorOptions::default()).unwrap();
        ScriptRunner::new(editor, Vec::new())
    }

    #[rstest]
    #[case::comment("# heading", None)]
    #[case::blank("   ", None)]
    #[case::click("click", Some(Command::Click))]
    #[case::typed("type two words", Some(Command::Type("two words".into())))]
    #[case::quote("quote", Some(Command::Block(BlockCommand::Blockquote)))]
    #[case::strike("strike", Some(Command::Inline(InlineStyle::Strikethrough)))]
    #[case::link("link https://x.org", Some(Command::Link("https://x.org".into())))]
    #[case::caret(
        "select 0/0 3",
        Some(Command::Select { start: (vec![0, 0], 3), end: None })
    )]
    #[case::range(
        "select 0/0 1 1/0 2",
        Some(Command::Select { start: (vec![0, 0], 1), end: Some((vec![1, 0], 2)) })
    )]
    #[case::shift_enter("key shift-enter", Some(Command::Key(KeyInput::with_shift(Key::Enter))))]
    fn parses_lines(#[case] line: &str, #[case] expected: Option<Command>) {
        assert_eq!(parse_line(line).unwrap(), expected);
    }

    #[rstest]
    #[case::unknown("explode")]
    #[case::bad_key("key escape")]
    #[case::missing_offset("select 0/0")]
    #[case::bad_path("select a/b 1")]
    #[case::no_url("link")]
    fn rejects_bad_lines(#[case] line: &str) {
        assert!(parse_line(line).is_err());
    }

    #[test]
    fn errors_name_the_line() {
        let mut runner = runner();
        let err = runner.run("click\nfrobnicate\n").unwrap_err();
        assert!(format!("{err:#}").starts_with("line 2"));
    }

    #[test]
    fn missing_node_is_an_error() {
        let mut runner = runner();
        assert!(runner.run("select 5/0 0").is_err());
    }

    #[test]
    fn header_script_round_trip() {
        let mut runner = runner();
        runner
            .run("select 0/0 0 0/0 5\nh1\nprint\nh1\nprint\n")
            .unwrap();

        let printed = String::from_utf8(runner.out.clone()).unwrap();
        assert_eq!(
            printed,
            "<h1>Start writing here!</h1>\n<p>Start writing here!</p>\n"
        );
    }

    #[test]
    fn saved_selection_is_restored_for_links() {
        let mut runner = runner();
        runner
            .run("select 0/0 0 0/0 5\nsave-selection\nselect 0/0 19\nrestore-selection\ntoggle-link https://x.org\n")
            .unwrap();

        insta::assert_snapshot!(
            runner.editor().html(),
            @r#"<p><a href="https://x.org">Start</a> writing here!</p>"#
        );

        runner.run("select 0/0/0 1\ntoggle-link https://x.org").unwrap();
        insta::assert_snapshot!(runner.editor().html(), @"<p>Start writing here!</p>");
    }

    #[test]
    fn pasted_html_arrives_as_text() {
        let mut runner = runner();
        runner
            .run("select 0/0 19\npaste-html  <b>more</b>")
            .unwrap();
        insta::assert_snapshot!(runner.editor().html(), @"<p>Start writing here! more</p>");
    }

    #[test]
    fn restore_without_save_fails() {
        let mut runner = runner();
        assert!(runner.run("restore-selection").is_err());
    }
}
