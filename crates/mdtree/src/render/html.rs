//! HTML backend.

use std::fmt::{self, Write};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use super::{Backend, Walk};
use crate::node::{ListType, NodeType};
use crate::node_ref::NodeRef;
use crate::options::RenderOptions;

const RAW_HTML_OMITTED: &str = "<!-- raw HTML omitted -->";

/// Bytes percent-encoded in `href`/`src` attributes. Existing `%` escapes are kept.
const HREF_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'[')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Escape `&`, `<`, `>` and `"` for HTML text and attribute values.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    push_escaped(&mut out, s);
    out
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

fn push_escaped_href(out: &mut String, url: &str) {
    for chunk in utf8_percent_encode(url, HREF_ENCODE) {
        for c in chunk.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '\'' => out.push_str("&#x27;"),
                _ => out.push(c),
            }
        }
    }
}

/// Whether `url` uses a scheme that can run script or read local files.
fn is_dangerous_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    if let Some(data) = lower.strip_prefix("data:") {
        return !["image/png", "image/gif", "image/jpeg", "image/webp"]
            .iter()
            .any(|kind| data.starts_with(kind));
    }
    ["javascript:", "vbscript:", "file:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

pub(crate) struct HtmlBackend {
    out: String,
    source_pos: bool,
    hard_breaks: bool,
    no_breaks: bool,
    allow_unsafe: bool,
}

impl HtmlBackend {
    pub(crate) fn new(options: &RenderOptions) -> Self {
        Self {
            out: String::new(),
            source_pos: options.source_pos,
            hard_breaks: options.hard_breaks,
            no_breaks: options.no_breaks,
            allow_unsafe: options.allows_unsafe(),
        }
    }

    fn cr(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    /// Open a block element: `<tag` plus the source position attribute.
    fn open(&mut self, tag: &str, node: NodeRef<'_>) -> fmt::Result {
        write!(self.out, "<{tag}")?;
        if self.source_pos {
            write!(self.out, " data-sourcepos=\"{}-{}\"", node.start(), node.end())?;
        }
        Ok(())
    }

    fn url(&mut self, url: &str) {
        if self.allow_unsafe || !is_dangerous_url(url) {
            push_escaped_href(&mut self.out, url);
        }
    }

    fn raw(&mut self, html: &str) {
        if self.allow_unsafe {
            self.out.push_str(html);
        } else {
            self.out.push_str(RAW_HTML_OMITTED);
        }
    }

    /// Image descriptions are rendered as plain text into the `alt` attribute.
    fn alt_text(&mut self, image: NodeRef<'_>) {
        for node in image.descendants().skip(1) {
            match node.node_type() {
                NodeType::Text | NodeType::Code | NodeType::HtmlInline => {
                    push_escaped(&mut self.out, node.literal().unwrap_or_default());
                }
                NodeType::SoftBreak | NodeType::LineBreak => self.out.push(' '),
                _ => {}
            }
        }
    }
}

/// Paragraphs directly inside items of a tight list render without `<p>`.
fn in_tight_list(paragraph: NodeRef<'_>) -> bool {
    paragraph
        .parent()
        .filter(|item| item.node_type() == NodeType::Item)
        .and_then(NodeRef::parent)
        .and_then(NodeRef::list_tight)
        .unwrap_or(false)
}

impl Backend for HtmlBackend {
    fn enter(&mut self, node: NodeRef<'_>) -> Result<Walk, fmt::Error> {
        match node.node_type() {
            NodeType::Document => {}
            NodeType::BlockQuote => {
                self.cr();
                self.open("blockquote", node)?;
                self.out.push_str(">\n");
            }
            NodeType::List => {
                self.cr();
                if node.list_type() == Some(ListType::Ordered) {
                    self.open("ol", node)?;
                    match node.list_start() {
                        Some(1) | None => {}
                        Some(start) => write!(self.out, " start=\"{start}\"")?,
                    }
                } else {
                    self.open("ul", node)?;
                }
                self.out.push_str(">\n");
            }
            NodeType::Item => {
                self.cr();
                self.open("li", node)?;
                self.out.push('>');
            }
            NodeType::Heading => {
                self.cr();
                let level = node.heading_level().unwrap_or(1);
                self.open(&format!("h{level}"), node)?;
                self.out.push('>');
            }
            NodeType::CodeBlock => {
                self.cr();
                self.open("pre", node)?;
                let lang = node
                    .fence_info()
                    .and_then(|info| info.split_whitespace().next())
                    .unwrap_or_default();
                if lang.is_empty() {
                    self.out.push_str("><code>");
                } else {
                    write!(self.out, "><code class=\"language-{}\">", escape_html(lang))?;
                }
                push_escaped(&mut self.out, node.literal().unwrap_or_default());
                self.out.push_str("</code></pre>\n");
            }
            NodeType::HtmlBlock => {
                self.cr();
                self.raw(node.literal().unwrap_or_default());
                self.cr();
            }
            NodeType::CustomBlock => {
                self.cr();
                self.out.push_str(node.on_enter().unwrap_or_default());
                self.cr();
            }
            NodeType::ThematicBreak => {
                self.cr();
                self.open("hr", node)?;
                self.out.push_str(" />\n");
            }
            NodeType::Paragraph => {
                if !in_tight_list(node) {
                    self.cr();
                    self.open("p", node)?;
                    self.out.push('>');
                }
            }
            NodeType::Text => push_escaped(&mut self.out, node.literal().unwrap_or_default()),
            NodeType::LineBreak => self.out.push_str("<br />\n"),
            NodeType::SoftBreak => {
                if self.hard_breaks {
                    self.out.push_str("<br />\n");
                } else if self.no_breaks {
                    self.out.push(' ');
                } else {
                    self.out.push('\n');
                }
            }
            NodeType::Code => {
                self.out.push_str("<code>");
                push_escaped(&mut self.out, node.literal().unwrap_or_default());
                self.out.push_str("</code>");
            }
            NodeType::HtmlInline => self.raw(node.literal().unwrap_or_default()),
            NodeType::CustomInline => self.out.push_str(node.on_enter().unwrap_or_default()),
            NodeType::Strong => self.out.push_str("<strong>"),
            NodeType::Emphasis => self.out.push_str("<em>"),
            NodeType::Link => {
                self.out.push_str("<a href=\"");
                self.url(node.url().unwrap_or_default());
                self.out.push('"');
                let title = node.title().unwrap_or_default();
                if !title.is_empty() {
                    self.out.push_str(" title=\"");
                    push_escaped(&mut self.out, title);
                    self.out.push('"');
                }
                self.out.push('>');
            }
            NodeType::Image => {
                self.out.push_str("<img src=\"");
                self.url(node.url().unwrap_or_default());
                self.out.push_str("\" alt=\"");
                self.alt_text(node);
                self.out.push('"');
                return Ok(Walk::Skip);
            }
        }
        Ok(Walk::Descend)
    }

    fn exit(&mut self, node: NodeRef<'_>) -> fmt::Result {
        match node.node_type() {
            NodeType::BlockQuote => {
                self.cr();
                self.out.push_str("</blockquote>\n");
            }
            NodeType::List => {
                self.cr();
                if node.list_type() == Some(ListType::Ordered) {
                    self.out.push_str("</ol>\n");
                } else {
                    self.out.push_str("</ul>\n");
                }
            }
            NodeType::Item => self.out.push_str("</li>\n"),
            NodeType::Heading => {
                writeln!(self.out, "</h{}>", node.heading_level().unwrap_or(1))?;
            }
            NodeType::CustomBlock => {
                self.cr();
                self.out.push_str(node.on_exit().unwrap_or_default());
                self.cr();
            }
            NodeType::Paragraph => {
                if !in_tight_list(node) {
                    self.out.push_str("</p>\n");
                }
            }
            NodeType::CustomInline => self.out.push_str(node.on_exit().unwrap_or_default()),
            NodeType::Strong => self.out.push_str("</strong>"),
            NodeType::Emphasis => self.out.push_str("</em>"),
            NodeType::Link => self.out.push_str("</a>"),
            NodeType::Image => {
                let title = node.title().unwrap_or_default();
                if !title.is_empty() {
                    self.out.push_str(" title=\"");
                    push_escaped(&mut self.out, title);
                    self.out.push('"');
                }
                self.out.push_str(" />");
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use pretty_assertions::assert_eq;

    fn render_html(markdown: &str) -> String {
        render_with(markdown, &RenderOptions::default())
    }

    fn render_with(markdown: &str, options: &RenderOptions) -> String {
        Document::parse(markdown, options).root().html(options)
    }

    #[test]
    fn test_html_heading_and_paragraph() {
        assert_eq!(render_html("# Title\n\nBody"), "<h1>Title</h1>\n<p>Body</p>\n");
    }

    #[test]
    fn test_html_escapes_text() {
        assert_eq!(
            render_html("a &amp; \\<b\\> \"q\""),
            "<p>a &amp; &lt;b&gt; &quot;q&quot;</p>\n"
        );
    }

    #[test]
    fn test_html_tight_and_loose_lists() {
        assert_eq!(render_html("- a\n- b\n"), "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n");
        assert_eq!(
            render_html("- a\n\n- b\n"),
            "<ul>\n<li>\n<p>a</p>\n</li>\n<li>\n<p>b</p>\n</li>\n</ul>\n"
        );
    }

    #[test]
    fn test_html_ordered_list_start() {
        assert_eq!(render_html("3. x\n"), "<ol start=\"3\">\n<li>x</li>\n</ol>\n");
        assert_eq!(render_html("1. x\n"), "<ol>\n<li>x</li>\n</ol>\n");
    }

    #[test]
    fn test_html_code_block() {
        assert_eq!(
            render_html("```rust extra\nlet a = 1 < 2;\n```\n"),
            "<pre><code class=\"language-rust\">let a = 1 &lt; 2;\n</code></pre>\n"
        );
    }

    #[test]
    fn test_html_blockquote_and_rule() {
        assert_eq!(
            render_html("> quote\n\n***\n"),
            "<blockquote>\n<p>quote</p>\n</blockquote>\n<hr />\n"
        );
    }

    #[test]
    fn test_html_raw_html_omitted_by_default() {
        let html = render_html("<div>x</div>\n\na <b>y</b>\n");
        assert!(!html.contains("<div>"));
        assert!(html.contains(RAW_HTML_OMITTED));
        assert!(html.contains("<p>a <!-- raw HTML omitted -->y<!-- raw HTML omitted --></p>"));
    }

    #[test]
    fn test_html_unsafe_keeps_raw_html() {
        let options = RenderOptions::new().with_unsafe();
        let html = render_with("<div>x</div>\n\na <b>y</b>\n", &options);
        assert_eq!(html, "<div>x</div>\n<p>a <b>y</b></p>\n");
    }

    #[test]
    fn test_html_unsafe_wins_over_safe() {
        let options = RenderOptions::new().with_safe().with_unsafe();
        assert!(render_with("<i>x</i>", &options).contains("<i>x</i>"));
    }

    #[test]
    fn test_html_dangerous_urls() {
        assert_eq!(render_html("[x](javascript:alert(1))"), "<p><a href=\"\">x</a></p>\n");
        assert_eq!(
            render_html("![x](data:image/png;base64,AAA)"),
            "<p><img src=\"data:image/png;base64,AAA\" alt=\"x\" /></p>\n"
        );
        let options = RenderOptions::new().with_unsafe();
        assert!(
            render_with("[x](javascript:alert(1))", &options)
                .contains("href=\"javascript:alert(1)\"")
        );
    }

    #[test]
    fn test_html_link_and_image() {
        assert_eq!(
            render_html("[a *b*](/u?x=1&y='2' \"T\")"),
            "<p><a href=\"/u?x=1&amp;y=&#x27;2&#x27;\" title=\"T\">a <em>b</em></a></p>\n"
        );
        assert_eq!(
            render_html("![alt *text*](/i%20.png \"t\")"),
            "<p><img src=\"/i%20.png\" alt=\"alt text\" title=\"t\" /></p>\n"
        );
    }

    #[test]
    fn test_html_href_percent_encoding() {
        assert_eq!(
            render_html("<http://x.org/a[b]>"),
            "<p><a href=\"http://x.org/a%5Bb%5D\">http://x.org/a[b]</a></p>\n"
        );
    }

    #[test]
    fn test_html_breaks() {
        assert_eq!(render_html("a\nb"), "<p>a\nb</p>\n");
        assert_eq!(render_html("a\\\nb"), "<p>a<br />\nb</p>\n");
        assert_eq!(
            render_with("a\nb", &RenderOptions::new().with_hard_breaks()),
            "<p>a<br />\nb</p>\n"
        );
        assert_eq!(render_with("a\nb", &RenderOptions::new().with_no_breaks()), "<p>a b</p>\n");
    }

    #[test]
    fn test_html_source_pos() {
        let options = RenderOptions::new().with_source_pos();
        assert_eq!(
            render_with("# Hi\n\ntext\n", &options),
            "<h1 data-sourcepos=\"1:1-1:4\">Hi</h1>\n<p data-sourcepos=\"3:1-3:4\">text</p>\n"
        );
    }

    #[test]
    fn test_html_code_span() {
        assert_eq!(render_html("`a<b`"), "<p><code>a&lt;b</code></p>\n");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">&</a>"),
            "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_dangerous_url_detection() {
        assert!(is_dangerous_url("JavaScript:alert(1)"));
        assert!(is_dangerous_url("vbscript:x"));
        assert!(is_dangerous_url("file:///etc/passwd"));
        assert!(is_dangerous_url("data:text/html,x"));
        assert!(!is_dangerous_url("data:image/webp;base64,x"));
        assert!(!is_dangerous_url("https://example.com"));
    }
}
