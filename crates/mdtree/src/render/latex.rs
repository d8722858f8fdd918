//! LaTeX backend.
//!
//! Links need `hyperref` and images `graphicx`; typographic quotes map to
//! TeX ligatures, other special characters to their text-mode commands.

use std::fmt;

use super::writer::{Escaping, LineWriter};
use super::{Backend, Walk};
use crate::node::{ListType, NodeType};
use crate::node_ref::NodeRef;
use crate::options::RenderOptions;

/// Counter names for nested `enumerate` environments.
const ENUM_COUNTERS: [&str; 4] = ["enumi", "enumii", "enumiii", "enumiv"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LinkKind {
    /// Empty destination.
    None,
    /// `<scheme:...>` whose text is the destination.
    Url,
    /// `<user@host>`.
    Email,
    /// `#anchor` into the same document.
    Internal,
    Normal,
}

fn link_kind(node: NodeRef<'_>) -> LinkKind {
    let url = node.url().unwrap_or_default();
    if url.is_empty() {
        return LinkKind::None;
    }
    if url.starts_with('#') {
        return LinkKind::Internal;
    }
    let text = node
        .first_child()
        .filter(|child| child.node_type() == NodeType::Text && child.next_sibling().is_none())
        .and_then(NodeRef::literal);
    let has_title = !node.title().unwrap_or_default().is_empty();
    match (text, url.strip_prefix("mailto:")) {
        (Some(text), Some(address)) if text == address => LinkKind::Email,
        (Some(text), None) if text == url && !has_title && url.contains(':') => LinkKind::Url,
        _ => LinkKind::Normal,
    }
}

/// Nesting depth of ordered lists at `list`, counting `list` itself.
fn enum_level(list: NodeRef<'_>) -> usize {
    std::iter::successors(Some(list), |node| node.parent())
        .filter(|node| node.list_type() == Some(ListType::Ordered))
        .count()
}

fn sectioning_command(level: u8) -> &'static str {
    match level {
        1 => "\\section",
        2 => "\\subsection",
        3 => "\\subsubsection",
        4 => "\\paragraph",
        _ => "\\subparagraph",
    }
}

pub(crate) struct LatexBackend {
    w: LineWriter,
    hard_breaks: bool,
    no_breaks: bool,
}

impl LatexBackend {
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

    fn enter_list(&mut self, node: NodeRef<'_>) {
        let ordered = node.list_type() == Some(ListType::Ordered);
        self.w.lit(if ordered {
            "\\begin{enumerate}"
        } else {
            "\\begin{itemize}"
        });
        self.w.cr();
        let start = node.list_start().unwrap_or(1);
        if ordered && start > 1 {
            let level = enum_level(node);
            if let Some(counter) = level.checked_sub(1).and_then(|i| ENUM_COUNTERS.get(i)) {
                self.w.lit(&format!("\\setcounter{{{counter}}}{{{}}}", start - 1));
            }
            self.w.cr();
        }
    }

    fn enter_link(&mut self, node: NodeRef<'_>) -> Walk {
        let url = node.url().unwrap_or_default();
        match link_kind(node) {
            LinkKind::Url => {
                self.w.lit("\\url{");
                self.w.out(url, false, Escaping::Url);
                self.w.lit("}");
                return Walk::Skip;
            }
            LinkKind::Email => {
                self.w.lit("\\href{");
                self.w.out(url, false, Escaping::Url);
                self.w.lit("}\\nolinkurl{");
            }
            LinkKind::Internal => {
                self.w.lit("\\protect\\hyperlink{");
                self.w.out(&url[1..], false, Escaping::Url);
                self.w.lit("}{");
            }
            LinkKind::Normal => {
                self.w.lit("\\href{");
                self.w.out(url, false, Escaping::Url);
                self.w.lit("}{");
            }
            LinkKind::None => self.w.lit("{"),
        }
        Walk::Descend
    }
}

impl Backend for LatexBackend {
    fn enter(&mut self, node: NodeRef<'_>) -> Result<Walk, fmt::Error> {
        match node.node_type() {
            NodeType::BlockQuote => {
                self.w.lit("\\begin{quote}");
                self.w.cr();
            }
            NodeType::List => self.enter_list(node),
            NodeType::Item => self.w.lit("\\item "),
            NodeType::Heading => {
                self.w.lit(sectioning_command(node.heading_level().unwrap_or(1)));
                self.w.lit("{");
            }
            NodeType::CodeBlock => {
                self.w.cr();
                self.w.lit("\\begin{verbatim}");
                self.w.cr();
                self.w.lit(node.literal().unwrap_or_default());
                self.w.cr();
                self.w.lit("\\end{verbatim}");
                self.w.blankline();
            }
            NodeType::CustomBlock => {
                self.w.cr();
                self.w.lit(node.on_enter().unwrap_or_default());
                self.w.cr();
            }
            NodeType::ThematicBreak => {
                self.w.blankline();
                self.w.lit("\\begin{center}\\rule{0.5\\linewidth}{\\linethickness}\\end{center}");
                self.w.blankline();
            }
            NodeType::Text => {
                let wrap = self.allow_wrap();
                self.w.out(node.literal().unwrap_or_default(), wrap, Escaping::Normal);
            }
            NodeType::LineBreak => {
                self.w.lit("\\\\");
                self.w.cr();
            }
            NodeType::SoftBreak => {
                if self.hard_breaks {
                    self.w.lit("\\\\");
                    self.w.cr();
                } else if self.w.width() == 0 && !self.no_breaks {
                    self.w.cr();
                } else {
                    let wrap = self.allow_wrap();
                    self.w.out(" ", wrap, Escaping::Normal);
                }
            }
            NodeType::Code => {
                self.w.lit("\\texttt{");
                self.w.out(node.literal().unwrap_or_default(), false, Escaping::Normal);
                self.w.lit("}");
            }
            NodeType::CustomInline => self.w.lit(node.on_enter().unwrap_or_default()),
            NodeType::Strong => self.w.lit("\\textbf{"),
            NodeType::Emphasis => self.w.lit("\\emph{"),
            NodeType::Link => return Ok(self.enter_link(node)),
            NodeType::Image => {
                self.w.lit("\\protect\\includegraphics{");
                self.w.out(node.url().unwrap_or_default(), false, Escaping::Url);
                self.w.lit("}");
                return Ok(Walk::Skip);
            }
            NodeType::Document
            | NodeType::Paragraph
            | NodeType::HtmlBlock
            | NodeType::HtmlInline => {}
        }
        Ok(Walk::Descend)
    }

    fn exit(&mut self, node: NodeRef<'_>) -> fmt::Result {
        match node.node_type() {
            NodeType::BlockQuote => {
                self.w.lit("\\end{quote}");
                self.w.blankline();
            }
            NodeType::List => {
                self.w.lit(if node.list_type() == Some(ListType::Ordered) {
                    "\\end{enumerate}"
                } else {
                    "\\end{itemize}"
                });
                self.w.blankline();
            }
            NodeType::Item => self.w.cr(),
            NodeType::Heading => {
                self.w.lit("}");
                self.w.blankline();
            }
            NodeType::CustomBlock => {
                self.w.cr();
                self.w.lit(node.on_exit().unwrap_or_default());
                self.w.cr();
            }
            NodeType::Paragraph => self.w.blankline(),
            NodeType::CustomInline => self.w.lit(node.on_exit().unwrap_or_default()),
            NodeType::Strong | NodeType::Emphasis => self.w.lit("}"),
            NodeType::Link => {
                if link_kind(node) != LinkKind::Url {
                    self.w.lit("}");
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> String {
        self.w.finish()
    }
}

fn escape_char(
    buf: &mut String,
    escaping: Escaping,
    c: char,
    next: Option<char>,
    _begin_content: bool,
) {
    let normal = escaping == Escaping::Normal;
    match c {
        '{' | '}' | '#' | '%' | '&' => {
            buf.push('\\');
            buf.push(c);
        }
        '$' | '_' => {
            if normal {
                buf.push('\\');
            }
            buf.push(c);
        }
        // Keeps `--` from becoming an en dash.
        '-' if next == Some('-') => buf.push_str("-{}"),
        '~' if normal => buf.push_str("\\textasciitilde{}"),
        '^' => buf.push_str("\\^{}"),
        '\\' if escaping == Escaping::Url => buf.push('/'),
        '\\' => buf.push_str("\\textbackslash{}"),
        '|' => buf.push_str("\\textbar{}"),
        '<' => buf.push_str("\\textless{}"),
        '>' => buf.push_str("\\textgreater{}"),
        '[' | ']' => {
            buf.push('{');
            buf.push(c);
            buf.push('}');
        }
        '"' => buf.push_str("\\textquotedbl{}"),
        '\'' => buf.push_str("\\textquotesingle{}"),
        '\u{a0}' => buf.push('~'),
        '\u{2026}' => buf.push_str("\\ldots{}"),
        '\u{2018}' if normal => buf.push('`'),
        '\u{2019}' if normal => buf.push('\''),
        '\u{201c}' if normal => buf.push_str("``"),
        '\u{201d}' if normal => buf.push_str("''"),
        '\u{2014}' if normal => buf.push_str("---"),
        '\u{2013}' if normal => buf.push_str("--"),
        _ => buf.push(c),
    }
}
