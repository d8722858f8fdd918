//! CommonMark backend.
//!
//! Output parses back to an equivalent tree. Block nesting is carried by the
//! [`LineWriter`] prefix, inline text is escaped so it cannot turn into syntax.

use std::fmt;

use super::writer::{Escaping, LineWriter};
use super::{Backend, Walk};
use crate::node::{ListDelim, ListType, NodeType};
use crate::node_ref::NodeRef;
use crate::options::RenderOptions;

pub(crate) struct CommonMarkBackend {
    w: LineWriter,
    hard_breaks: bool,
    no_breaks: bool,
}

impl CommonMarkBackend {
    pub(crate) fn new(options: &RenderOptions, width: usize) -> Self {
        Self {
            w: LineWriter::new(width, escape_char),
            hard_breaks: options.hard_breaks,
            no_breaks: options.no_breaks,
        }
    }

    fn allow_wrap(&self) -> bool {
        self.w.width() > 0 && !self.no_breaks && !self.hard_breaks
    }

    fn update_tight_item(&mut self, node: NodeRef<'_>, entering: bool) {
        // The first item keeps the state of what came before the list.
        if entering && node.node_type() == NodeType::Item && node.previous_sibling().is_none() {
            return;
        }
        let tight = containing_block(node).is_some_and(|block| {
            is_tight_item(Some(block)) || is_tight_item(block.parent())
        });
        self.w.set_in_tight_list_item(tight);
    }

    fn enter_item(&mut self, node: NodeRef<'_>) {
        let marker = item_marker(node);
        if node.first_child().is_some() {
            self.w.lit(&marker);
        } else {
            self.w.lit(marker.trim_end());
        }
        self.w.begin_content();
        let width = marker.chars().count();
        self.w.push_prefix(&" ".repeat(width));
    }

    fn code_block(&mut self, node: NodeRef<'_>) {
        let first_in_item = node.previous_sibling().is_none()
            && node.parent().is_some_and(|p| p.node_type() == NodeType::Item);
        if !first_in_item {
            self.w.blankline();
        }
        let literal = node.literal().unwrap_or_default();

        if node.fence_info().is_none() && !first_in_item && can_indent(literal) {
            self.w.lit("    ");
            let len = self.w.prefix_len();
            self.w.push_prefix("    ");
            self.w.lit(literal);
            self.w.truncate_prefix(len);
        } else {
            let info = node.fence_info().unwrap_or_default();
            let fence_char = if info.contains('`') { '~' } else { '`' };
            let fence = fence_char
                .to_string()
                .repeat((longest_run(literal, fence_char) + 1).max(3));
            self.w.lit(&fence);
            self.w.lit(info);
            self.w.cr();
            self.w.lit(literal);
            self.w.cr();
            self.w.lit(&fence);
        }
        self.w.blankline();
    }

    fn code_span(&mut self, node: NodeRef<'_>) {
        let code = node.literal().unwrap_or_default();
        let ticks = "`".repeat(shortest_unused_run(code));
        let pad = code.is_empty()
            || code.starts_with('`')
            || code.ends_with('`')
            || (code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty());
        self.w.lit(&ticks);
        if pad {
            self.w.lit(" ");
        }
        let wrap = self.allow_wrap();
        self.w.out(code, wrap, Escaping::Literal);
        if pad {
            self.w.lit(" ");
        }
        self.w.lit(&ticks);
    }

    fn text(&mut self, node: NodeRef<'_>) {
        let literal = node.literal().unwrap_or_default();
        let wrap = self.allow_wrap();
        // A trailing `!` would turn a following link into an image.
        let before_link = node
            .next_sibling()
            .is_some_and(|next| matches!(next.node_type(), NodeType::Link | NodeType::Image));
        match literal.strip_suffix('!') {
            Some(head) if before_link => {
                self.w.out(head, wrap, Escaping::Normal);
                self.w.lit("\\!");
            }
            _ => self.w.out(literal, wrap, Escaping::Normal),
        }
    }

    fn soft_break(&mut self) {
        if self.hard_breaks {
            self.w.lit("\\");
            self.w.cr();
        } else if !self.w.no_linebreaks() && self.w.width() == 0 && !self.no_breaks {
            self.w.cr();
        } else {
            let wrap = self.allow_wrap();
            self.w.out(" ", wrap, Escaping::Literal);
        }
    }

    /// Closing part of a link or image: `](url "title")`.
    fn destination(&mut self, node: NodeRef<'_>) {
        self.w.lit("](");
        let url = node.url().unwrap_or_default();
        if url.is_empty() {
            self.w.lit("<>");
        } else {
            self.w.out(url, false, Escaping::Url);
        }
        let title = node.title().unwrap_or_default();
        if !title.is_empty() {
            self.w.lit(" \"");
            self.w.out(title, false, Escaping::Title);
            self.w.lit("\"");
        }
        self.w.lit(")");
    }
}

impl Backend for CommonMarkBackend {
    fn enter(&mut self, node: NodeRef<'_>) -> Result<Walk, fmt::Error> {
        self.update_tight_item(node, true);
        match node.node_type() {
            NodeType::Document | NodeType::List | NodeType::Paragraph => {}
            NodeType::BlockQuote => {
                self.w.lit("> ");
                self.w.begin_content();
                self.w.push_prefix("> ");
            }
            NodeType::Item => self.enter_item(node),
            NodeType::Heading => {
                let level = usize::from(node.heading_level().unwrap_or(1));
                self.w.lit(&"#".repeat(level));
                self.w.lit(" ");
                self.w.begin_content();
                self.w.set_no_linebreaks(true);
            }
            NodeType::CodeBlock => self.code_block(node),
            NodeType::HtmlBlock => {
                self.w.blankline();
                self.w.lit(node.literal().unwrap_or_default());
                self.w.blankline();
            }
            NodeType::CustomBlock => {
                self.w.blankline();
                self.w.lit(node.on_enter().unwrap_or_default());
                self.w.blankline();
            }
            NodeType::ThematicBreak => {
                self.w.blankline();
                self.w.lit("-----");
                self.w.blankline();
            }
            NodeType::Text => self.text(node),
            NodeType::LineBreak => {
                if !self.hard_breaks {
                    self.w.lit("\\");
                }
                self.w.cr();
            }
            NodeType::SoftBreak => self.soft_break(),
            NodeType::Code => self.code_span(node),
            NodeType::HtmlInline => self.w.lit(node.literal().unwrap_or_default()),
            NodeType::CustomInline => self.w.lit(node.on_enter().unwrap_or_default()),
            NodeType::Strong => {
                if !parent_is(node, NodeType::Strong) {
                    self.w.lit("**");
                }
            }
            NodeType::Emphasis => self.w.lit(emph_delim(node)),
            NodeType::Link => {
                if let Some(target) = autolink_target(node) {
                    self.w.lit("<");
                    self.w.lit(target);
                    self.w.lit(">");
                    return Ok(Walk::Skip);
                }
                self.w.lit("[");
            }
            NodeType::Image => self.w.lit("!["),
        }
        Ok(Walk::Descend)
    }

    fn exit(&mut self, node: NodeRef<'_>) -> fmt::Result {
        self.update_tight_item(node, false);
        match node.node_type() {
            NodeType::BlockQuote => {
                let len = self.w.prefix_len().saturating_sub(2);
                self.w.truncate_prefix(len);
                self.w.blankline();
            }
            NodeType::List => {
                // Keeps a following list or indented code block from joining this list.
                if node.next_sibling().is_some_and(|next| {
                    matches!(next.node_type(), NodeType::List | NodeType::CodeBlock)
                }) {
                    self.w.cr();
                    self.w.lit("<!-- end list -->");
                    self.w.blankline();
                }
            }
            NodeType::Item => {
                let width = item_marker(node).chars().count();
                let len = self.w.prefix_len().saturating_sub(width);
                self.w.truncate_prefix(len);
                self.w.cr();
            }
            NodeType::Heading => {
                self.w.set_no_linebreaks(false);
                self.w.blankline();
            }
            NodeType::Paragraph => self.w.blankline(),
            NodeType::CustomBlock => {
                self.w.blankline();
                self.w.lit(node.on_exit().unwrap_or_default());
                self.w.blankline();
            }
            NodeType::CustomInline => self.w.lit(node.on_exit().unwrap_or_default()),
            NodeType::Strong => {
                if !parent_is(node, NodeType::Strong) {
                    self.w.lit("**");
                }
            }
            NodeType::Emphasis => self.w.lit(emph_delim(node)),
            NodeType::Link => {
                if autolink_target(node).is_none() {
                    self.destination(node);
                }
            }
            NodeType::Image => self.destination(node),
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> String {
        self.w.finish()
    }
}

fn parent_is(node: NodeRef<'_>, node_type: NodeType) -> bool {
    node.parent().is_some_and(|p| p.node_type() == node_type)
}

/// `_` for an emphasis that is the only child of another emphasis, since `**x**`
/// would read back as strong.
fn emph_delim(node: NodeRef<'_>) -> &'static str {
    if parent_is(node, NodeType::Emphasis)
        && node.previous_sibling().is_none()
        && node.next_sibling().is_none()
    {
        "_"
    } else {
        "*"
    }
}

/// Nearest block-level node at or above `node`.
fn containing_block(node: NodeRef<'_>) -> Option<NodeRef<'_>> {
    let mut current = Some(node);
    while let Some(n) = current {
        if n.node_type().is_block() {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

fn is_tight_item(node: Option<NodeRef<'_>>) -> bool {
    node.filter(|n| n.node_type() == NodeType::Item)
        .and_then(NodeRef::parent)
        .and_then(NodeRef::list_tight)
        .unwrap_or(false)
}

/// Marker for a list item, including the trailing space(s).
fn item_marker(item: NodeRef<'_>) -> String {
    let Some(list) = item.parent().filter(|p| p.node_type() == NodeType::List) else {
        return "- ".to_owned();
    };
    if list.list_type() != Some(ListType::Ordered) {
        return format!("{} ", list.list_bullet().unwrap_or('-'));
    }
    let index = u32::try_from(item_index(item)).unwrap_or(u32::MAX);
    let number = list.list_start().unwrap_or(1).saturating_add(index);
    let delim = match list.list_delim() {
        Some(ListDelim::Paren) => ')',
        _ => '.',
    };
    format!("{number}{delim} ")
}

fn item_index(item: NodeRef<'_>) -> usize {
    std::iter::successors(item.previous_sibling(), |prev| prev.previous_sibling()).count()
}

/// Destination to print as `<...>` if the link is an autolink.
fn autolink_target(node: NodeRef<'_>) -> Option<&str> {
    let url = node.url()?;
    if url.is_empty() || !has_scheme(url) || !node.title().unwrap_or_default().is_empty() {
        return None;
    }
    let text = node.first_child()?;
    if text.node_type() != NodeType::Text || text.next_sibling().is_some() {
        return None;
    }
    let target = url.strip_prefix("mailto:").unwrap_or(url);
    (text.literal() == Some(target)).then_some(target)
}

/// `scheme:` with a 2-32 character scheme, as accepted inside `<...>`.
fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    (2..=32).contains(&scheme.len())
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

/// An indented block cannot start or end with whitespace lines.
fn can_indent(literal: &str) -> bool {
    let bytes = literal.as_bytes();
    bytes.len() > 2
        && !bytes[0].is_ascii_whitespace()
        && !(bytes[bytes.len() - 1].is_ascii_whitespace()
            && bytes[bytes.len() - 2].is_ascii_whitespace())
}

fn longest_run(s: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in s.chars() {
        if ch == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Smallest backtick count that does not occur as a run in `code`.
fn shortest_unused_run(code: &str) -> usize {
    let mut runs = Vec::new();
    let mut current = 0;
    for ch in code.chars().chain(std::iter::once('\0')) {
        if ch == '`' {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }
    (1..).find(|n| !runs.contains(n)).unwrap_or(1)
}

fn escape_char(
    buf: &mut String,
    escaping: Escaping,
    c: char,
    next: Option<char>,
    begin_content: bool,
) {
    let follows_digit = buf.as_bytes().last().is_some_and(u8::is_ascii_digit);
    let needs_escape = c.is_ascii()
        && match escaping {
            Escaping::Literal => false,
            Escaping::Normal => {
                matches!(c, '*' | '_' | '[' | ']' | '#' | '<' | '>' | '\\' | '`' | '~')
                    || c < ' '
                    || (c == '!' && next == Some('['))
                    || (c == '&' && next.is_some_and(|n| n.is_ascii_alphabetic() || n == '#'))
                    || (begin_content && matches!(c, '-' | '+' | '=') && !follows_digit)
                    || (begin_content
                        && matches!(c, '.' | ')')
                        && follows_digit
                        && next.is_none_or(|n| n.is_ascii_whitespace()))
            }
            Escaping::Url => {
                matches!(c, '`' | '<' | '>' | '\\' | '(' | ')') || c.is_ascii_whitespace()
            }
            Escaping::Title => matches!(c, '`' | '<' | '>' | '"' | '\\'),
        };

    if !needs_escape {
        buf.push(c);
    } else if escaping == Escaping::Url && c.is_ascii_whitespace() {
        buf.push_str(&format!("%{:02X}", u32::from(c)));
    } else if c.is_ascii_punctuation() {
        buf.push('\\');
        buf.push(c);
    } else {
        buf.push_str(&format!("&#{};", u32::from(c)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use pretty_assertions::assert_eq;

    fn render_cm(markdown: &str) -> String {
        Document::from_markdown_text(markdown)
            .unwrap()
            .root()
            .commonmark(&RenderOptions::default())
    }

    fn assert_round_trip(markdown: &str) {
        assert_eq!(render_cm(markdown), markdown);
    }

    #[test]
    fn test_canonical_documents_round_trip() {
        assert_round_trip("# Title\n\nBody\n");
        assert_round_trip(
            "## Sub *emph* **strong**\n\nA `code` span and [link](/url \"title\").\n",
        );
        assert_round_trip("> quoted text\n\n-----\n");
        assert_round_trip("- a\n- b\n");
        assert_round_trip("1. one\n2. two\n");
        assert_round_trip("```rust\nfn main() {}\n```\n");
        assert_round_trip("![alt](img.png)\n");
        assert_round_trip("<https://example.com>\n");
    }

    #[test]
    fn test_render_is_idempotent() {
        let input = "Title\n=====\n\n* a\n* b\n\n3) x\n\n> q\n";
        let once = render_cm(input);
        assert_eq!(render_cm(&once), once);
    }

    #[test]
    fn test_loose_list() {
        assert_eq!(render_cm("- a\n\n- b\n"), "- a\n\n- b\n");
    }

    #[test]
    fn test_nested_list_and_quote() {
        assert_eq!(render_cm("- a\n  - b\n"), "- a\n  - b\n");
        assert_eq!(render_cm("> - a\n> - b\n"), "> - a\n> - b\n");
    }

    #[test]
    fn test_ordered_list_numbering() {
        assert_eq!(render_cm("7) x\n8) y\n"), "7) x\n8) y\n");
    }

    #[test]
    fn test_setext_heading_becomes_atx() {
        assert_eq!(render_cm("Title\n-----\n"), "## Title\n");
    }

    #[test]
    fn test_indented_code() {
        assert_eq!(render_cm("para\n\n    code\n"), "para\n\n    code\n");
    }

    #[test]
    fn test_fence_longer_than_backtick_runs() {
        assert_eq!(render_cm("````\n```\n````\n"), "````\n```\n````\n");
    }

    #[test]
    fn test_escapes_inline_syntax() {
        assert_eq!(render_cm("\\*not emph\\*\n"), "\\*not emph\\*\n");
        assert_eq!(render_cm("\\# not heading\n"), "\\# not heading\n");
        assert_eq!(render_cm("\\- not item\n"), "\\- not item\n");
        assert_eq!(render_cm("1\\. not item\n"), "1\\. not item\n");
    }

    #[test]
    fn test_code_span_backticks() {
        assert_eq!(render_cm("`` a`b ``\n"), "``a`b``\n");
        assert_eq!(render_cm("`` `x ``\n"), "`` `x ``\n");
    }

    #[test]
    fn test_breaks() {
        assert_eq!(render_cm("a\\\nb\n"), "a\\\nb\n");
        assert_eq!(render_cm("a\nb\n"), "a b\n");
    }

    #[test]
    fn test_wraps_long_paragraph() {
        let text = "lorem ipsum ".repeat(10);
        let out = render_cm(&text);
        assert!(out.lines().all(|line| line.chars().count() <= 80));
        assert!(out.lines().count() > 1);
    }

    #[test]
    fn test_separates_adjacent_lists() {
        let doc = Document::from_markdown_text("- a\n\n+ b\n").unwrap();
        assert_eq!(doc.root().children().len(), 2);
        assert_eq!(
            doc.root().commonmark(&RenderOptions::default()),
            "- a\n\n<!-- end list -->\n\n+ b\n"
        );
    }

    #[test]
    fn test_email_autolink() {
        assert_eq!(render_cm("<me@example.com>\n"), "<me@example.com>\n");
    }

    #[test]
    fn test_link_destination_escaping() {
        assert_eq!(render_cm("[a](<b c>)\n"), "[a](b%20c)\n");
    }

    #[test]
    fn test_keeps_bullet_character() {
        assert_round_trip("* a\n* b\n");
        assert_round_trip("+ a\n\n+ b\n");
    }

    #[test]
    fn test_empty_destination_with_title() {
        let once = render_cm("[a](<> \"t\")\n");
        assert_eq!(once, "[a](<> \"t\")\n");
        let doc = Document::from_markdown_text(&once).unwrap();
        let link = doc.root().first_child().unwrap().first_child().unwrap();
        assert_eq!(link.node_type(), NodeType::Link);
        assert_eq!(link.url(), Some(""));
        assert_eq!(link.title(), Some("t"));
    }

    #[test]
    fn test_bang_before_link_stays_text() {
        let once = render_cm("\\![a](b)\n");
        assert_eq!(once, "\\![a](b)\n");
        let doc = Document::from_markdown_text(&once).unwrap();
        let para = doc.root().first_child().unwrap();
        let kinds: Vec<_> = para.children().iter().map(|n| n.node_type()).collect();
        assert_eq!(kinds, vec![NodeType::Text, NodeType::Link]);
    }

    #[test]
    fn test_shortest_unused_run() {
        assert_eq!(shortest_unused_run("abc"), 1);
        assert_eq!(shortest_unused_run("a`b"), 2);
        assert_eq!(shortest_unused_run("a`b``c"), 3);
        assert_eq!(shortest_unused_run("``"), 1);
    }
}
