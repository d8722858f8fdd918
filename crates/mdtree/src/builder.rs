//! Builds a [`Document`] from the `pulldown-cmark` event stream.
//!
//! The parser reports tight list items without paragraph events. The builder
//! wraps such inline runs in an implicit `Paragraph` so the resulting tree
//! always has the CommonMark shape, and marks lists loose when an explicit
//! paragraph appears directly inside one of their items or when a blank line
//! separates two items or two blocks of one item.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd};

use crate::node::{
    CodeBlockData, CustomData, LinkData, ListData, ListDelim, ListType, NodeType, NodeValue,
};
use crate::options::RenderOptions;
use crate::position::LineIndex;
use crate::tree::{Document, NodeId};

/// Parse `text` into a new document.
pub(crate) fn build(text: &str, options: &RenderOptions) -> Document {
    let mut builder = TreeBuilder::new(text);
    for (event, range) in Parser::new_ext(text, parser_options(options)).into_offset_iter() {
        builder.event(event, range);
    }
    let mut doc = builder.finish();
    if options.normalize {
        doc.normalize();
    }
    tracing::debug!(
        bytes = text.len(),
        nodes = doc.node_count(),
        "Parsed markdown document"
    );
    doc
}

/// CommonMark only; extensions stay off so the tree matches the core taxonomy.
fn parser_options(options: &RenderOptions) -> Options {
    if options.smart {
        Options::ENABLE_SMART_PUNCTUATION
    } else {
        Options::empty()
    }
}

/// Convert heading level enum to number (1-6).
fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

struct OpenNode {
    id: NodeId,
    /// Byte offset where the node starts.
    start: usize,
    /// Paragraph synthesized around inline content of a tight list item.
    implicit: bool,
}

struct TreeBuilder<'a> {
    source: &'a str,
    lines: LineIndex<'a>,
    doc: Document,
    stack: Vec<OpenNode>,
    /// End offset of the last inline event, used to close implicit paragraphs.
    last_inline_end: usize,
    /// End offset of the last closed block, trailing whitespace excluded.
    last_block_end: usize,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            lines: LineIndex::new(source),
            doc: Document::new(),
            stack: vec![OpenNode {
                id: NodeId::ROOT,
                start: 0,
                implicit: false,
            }],
            last_inline_end: 0,
            last_block_end: 0,
        }
    }

    fn top(&self) -> &OpenNode {
        // The root entry is never popped.
        &self.stack[self.stack.len() - 1]
    }

    fn top_type(&self) -> NodeType {
        self.doc.data(self.top().id).value.node_type()
    }

    fn event(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start_tag(tag, range),
            Event::End(tag) => self.end_tag(tag, range),
            Event::Text(text) => self.text(&text, range),
            Event::Code(code) => self.inline(NodeValue::Code(code.into_string()), range),
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.inline(NodeValue::Text(math.into_string()), range);
            }
            Event::Html(html) => self.html(&html, range),
            Event::InlineHtml(html) => {
                self.inline(NodeValue::HtmlInline(html.into_string()), range);
            }
            Event::FootnoteReference(label) => {
                self.inline(NodeValue::Text(format!("[^{label}]")), range);
            }
            Event::SoftBreak => self.inline(NodeValue::SoftBreak, range),
            Event::HardBreak => self.inline(NodeValue::LineBreak, range),
            Event::Rule => {
                self.close_implicit_paragraph();
                self.mark_loose_if_blank_line_before(range.start);
                let id = self.alloc(NodeValue::ThematicBreak, &range);
                self.doc.link_last(self.top().id, id);
                self.last_block_end = self.trimmed_end(&range);
            }
            Event::TaskListMarker(_) => {
                // Not enabled
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>, range: Range<usize>) {
        let value = match tag {
            Tag::Paragraph => {
                self.mark_loose_if_in_item();
                NodeValue::Paragraph
            }
            Tag::Heading { level, .. } => NodeValue::Heading(heading_level_to_num(level)),
            Tag::BlockQuote(_) => NodeValue::BlockQuote,
            Tag::CodeBlock(kind) => NodeValue::CodeBlock(CodeBlockData {
                info: match kind {
                    CodeBlockKind::Fenced(info) => Some(info.into_string()),
                    CodeBlockKind::Indented => None,
                },
                literal: String::new(),
            }),
            Tag::HtmlBlock => NodeValue::HtmlBlock(String::new()),
            Tag::List(start) => NodeValue::List(self.list_data(start, range.start)),
            Tag::Item => NodeValue::Item,
            Tag::Emphasis => NodeValue::Emphasis,
            Tag::Strong => NodeValue::Strong,
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => NodeValue::Link(link_data(link_type, &dest_url, &title)),
            Tag::Image {
                link_type,
                dest_url,
                title,
                ..
            } => NodeValue::Image(link_data(link_type, &dest_url, &title)),
            Tag::Strikethrough | Tag::Superscript | Tag::Subscript => {
                NodeValue::CustomInline(CustomData::default())
            }
            Tag::FootnoteDefinition(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::Table(_)
            | Tag::TableHead
            | Tag::TableRow
            | Tag::TableCell
            | Tag::MetadataBlock(_) => NodeValue::CustomBlock(CustomData::default()),
        };

        if value.node_type().is_block() {
            self.open_block(value, &range);
        } else {
            let id = self.attach_inline(value, &range);
            self.stack.push(OpenNode {
                id,
                start: range.start,
                implicit: false,
            });
        }
    }

    fn end_tag(&mut self, _tag: TagEnd, range: Range<usize>) {
        self.close_implicit_paragraph();
        if self.stack.len() > 1
            && let Some(open) = self.stack.pop()
        {
            let span = open.start..range.end;
            self.close(open.id, &span);
            if self.doc.data(open.id).value.node_type().is_block() {
                self.last_block_end = self.trimmed_end(&span);
            }
        }
    }

    fn text(&mut self, text: &str, range: Range<usize>) {
        if let Some(literal) = self.open_literal() {
            literal.push_str(text);
        } else {
            self.inline(NodeValue::Text(text.to_owned()), range);
        }
    }

    fn html(&mut self, html: &str, range: Range<usize>) {
        if let Some(literal) = self.open_literal() {
            literal.push_str(html);
        } else {
            self.inline(NodeValue::HtmlInline(html.to_owned()), range);
        }
    }

    /// Literal buffer of the innermost node when it is a code or HTML block.
    fn open_literal(&mut self) -> Option<&mut String> {
        let id = self.top().id;
        match &mut self.doc.data_mut(id).value {
            NodeValue::CodeBlock(code) => Some(&mut code.literal),
            NodeValue::HtmlBlock(html) => Some(html),
            _ => None,
        }
    }

    /// Attach a leaf inline node.
    fn inline(&mut self, value: NodeValue, range: Range<usize>) {
        let id = self.attach_inline(value, &range);
        self.close(id, &range);
    }

    fn attach_inline(&mut self, value: NodeValue, range: &Range<usize>) -> NodeId {
        if !self.top_type().can_contain(value.node_type()) {
            self.open_implicit_paragraph(range.start);
        }
        self.last_inline_end = range.end;
        let id = self.alloc(value, range);
        self.doc.link_last(self.top().id, id);
        id
    }

    fn alloc(&mut self, value: NodeValue, range: &Range<usize>) -> NodeId {
        let start = self.lines.position(range.start);
        let end = self.lines.end_position(range.start, range.end);
        self.doc.alloc(value, start, end)
    }

    fn open_block(&mut self, value: NodeValue, range: &Range<usize>) {
        self.close_implicit_paragraph();
        self.mark_loose_if_blank_line_before(range.start);
        let id = self.alloc(value, range);
        self.doc.link_last(self.top().id, id);
        self.stack.push(OpenNode {
            id,
            start: range.start,
            implicit: false,
        });
    }

    fn close(&mut self, id: NodeId, range: &Range<usize>) {
        let end = self.lines.end_position(range.start, range.end);
        self.doc.data_mut(id).end = end;
    }

    fn open_implicit_paragraph(&mut self, start: usize) {
        self.mark_loose_if_blank_line_before(start);
        let position = self.lines.position(start);
        let id = self.doc.alloc(NodeValue::Paragraph, position, position);
        self.doc.link_last(self.top().id, id);
        self.stack.push(OpenNode {
            id,
            start,
            implicit: true,
        });
    }

    fn close_implicit_paragraph(&mut self) {
        if self.top().implicit
            && let Some(open) = self.stack.pop()
        {
            let end = self.last_inline_end.max(open.start);
            self.close(open.id, &(open.start..end));
            self.last_block_end = end;
        }
    }

    /// An explicit paragraph directly inside an item makes the list loose.
    fn mark_loose_if_in_item(&mut self) {
        self.close_implicit_paragraph();
        if self.top_type() != NodeType::Item {
            return;
        }
        let list = self.doc.data(self.top().id).parent;
        if let Some(list) = list
            && let Some(data) = self.doc.data_mut(list).value.list_mut()
        {
            data.tight = false;
        }
    }

    /// A blank line between a new block and its previous sibling makes the
    /// enclosing list loose, whether the siblings are items or item children.
    fn mark_loose_if_blank_line_before(&mut self, start: usize) {
        let top = self.doc.data(self.top().id);
        if top.last_child.is_none() {
            return;
        }
        let list = match top.value.node_type() {
            NodeType::List => Some(self.top().id),
            NodeType::Item => top.parent,
            _ => None,
        };
        let Some(list) = list else {
            return;
        };
        let blank = self
            .source
            .get(self.last_block_end..start)
            .is_some_and(has_blank_line);
        if blank && let Some(data) = self.doc.data_mut(list).value.list_mut() {
            data.tight = false;
        }
    }

    fn trimmed_end(&self, range: &Range<usize>) -> usize {
        self.source
            .get(range.clone())
            .map_or(range.end, |text| range.start + text.trim_end().len())
    }

    /// List properties, recovering the marker from the source text.
    fn list_data(&self, start: Option<u64>, offset: usize) -> ListData {
        let marker = self.source[offset..].trim_start_matches([' ', '\t']);
        match start {
            Some(number) => {
                let after_digits = marker.trim_start_matches(|c: char| c.is_ascii_digit());
                let delim = if after_digits.starts_with(')') {
                    ListDelim::Paren
                } else {
                    ListDelim::Period
                };
                ListData {
                    list_type: ListType::Ordered,
                    start: u32::try_from(number).unwrap_or(u32::MAX),
                    delim: Some(delim),
                    ..ListData::default()
                }
            }
            None => ListData {
                bullet: marker
                    .chars()
                    .next()
                    .filter(|c| matches!(*c, '-' | '+' | '*'))
                    .unwrap_or('-'),
                ..ListData::default()
            },
        }
    }

    fn finish(mut self) -> Document {
        self.close_implicit_paragraph();
        let end = self.lines.end_position(0, self.source.len());
        self.doc.data_mut(NodeId::ROOT).end = end;
        self.doc
    }
}

/// Whether `gap`, the text between two blocks, spans a line holding nothing
/// but whitespace and block quote markers.
fn has_blank_line(gap: &str) -> bool {
    let gap = gap.replace("\r\n", "\n");
    let lines: Vec<&str> = gap.split(['\n', '\r']).collect();
    lines.len() > 2
        && lines[1..lines.len() - 1]
            .iter()
            .any(|line| line.trim_matches(|c: char| c == '>' || c.is_whitespace()).is_empty())
}

fn link_data(link_type: LinkType, dest_url: &str, title: &str) -> LinkData {
    let url = if link_type == LinkType::Email && !dest_url.starts_with("mailto:") {
        format!("mailto:{dest_url}")
    } else {
        dest_url.to_owned()
    };
    LinkData {
        url,
        title: title.to_owned(),
    }
}
