//! Rendering of a tree or subtree to HTML, XML, CommonMark and LaTeX.
//!
//! Every format is a [`Backend`] driven by one enter/exit walk over the
//! subtree. Backends accumulate output in a `String`; each call to [`render`]
//! builds a fresh backend, so no state survives between calls.

mod commonmark;
mod html;
mod latex;
mod writer;
mod xml;

use std::fmt;

pub use html::escape_html;

use crate::error::RenderError;
use crate::iter::NodeEdge;
use crate::node_ref::NodeRef;
use crate::options::RenderOptions;
use crate::tree::Document;

/// Wrap width used by the CommonMark and LaTeX renderers.
pub const DEFAULT_WIDTH: usize = 80;

/// Output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderFormat {
    Html,
    Xml,
    CommonMark,
    Latex,
}

impl RenderFormat {
    /// Lowercase name of the format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Xml => "xml",
            Self::CommonMark => "commonmark",
            Self::Latex => "latex",
        }
    }
}

impl fmt::Display for RenderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the walker does after a node has been entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Walk {
    Descend,
    /// Skip the children; `exit` is still called.
    Skip,
}

/// Format-specific output for the generic walker.
pub(crate) trait Backend {
    fn enter(&mut self, node: NodeRef<'_>) -> Result<Walk, fmt::Error>;

    fn exit(&mut self, node: NodeRef<'_>) -> fmt::Result;

    fn finish(self) -> String;
}

fn drive<B: Backend>(mut backend: B, node: NodeRef<'_>) -> Result<String, RenderError> {
    let mut walk = node.traverse();
    while let Some(edge) = walk.next() {
        match edge {
            NodeEdge::Enter(node) => {
                if backend.enter(node)? == Walk::Skip {
                    walk.skip_children();
                }
            }
            NodeEdge::Exit(node) => backend.exit(node)?,
        }
    }
    Ok(backend.finish())
}

/// Render the subtree rooted at `node`.
///
/// Wrapping formats use [`DEFAULT_WIDTH`].
///
/// # Errors
///
/// Returns [`RenderError::Format`] if the backend fails to write its output.
pub fn render(
    node: NodeRef<'_>,
    format: RenderFormat,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    render_with_width(node, format, options, DEFAULT_WIDTH)
}

/// Render the subtree rooted at `node`, wrapping CommonMark and LaTeX output at
/// `width` columns. A width of `0` disables wrapping; HTML and XML ignore it.
///
/// # Errors
///
/// Returns [`RenderError::Format`] if the backend fails to write its output.
pub fn render_with_width(
    node: NodeRef<'_>,
    format: RenderFormat,
    options: &RenderOptions,
    width: usize,
) -> Result<String, RenderError> {
    match format {
        RenderFormat::Html => drive(html::HtmlBackend::new(options), node),
        RenderFormat::Xml => drive(xml::XmlBackend::new(options), node),
        RenderFormat::CommonMark => {
            let width = if options.no_breaks || options.hard_breaks {
                0
            } else {
                width
            };
            drive(commonmark::CommonMarkBackend::new(options, width), node)
        }
        RenderFormat::Latex => {
            let width = if options.no_breaks { 0 } else { width };
            drive(latex::LatexBackend::new(options, width), node)
        }
    }
}

/// Parse `text` and render the whole document as HTML.
#[must_use]
pub fn markdown_to_html(text: &str, options: &RenderOptions) -> String {
    Document::parse(text, options).root().html(options)
}

impl NodeRef<'_> {
    /// Render this subtree, see [`render`].
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Format`] if the backend fails to write its output.
    pub fn render(
        self,
        format: RenderFormat,
        options: &RenderOptions,
    ) -> Result<String, RenderError> {
        render(self, format, options)
    }

    /// HTML for this subtree.
    #[must_use]
    pub fn html(self, options: &RenderOptions) -> String {
        self.render_or_empty(RenderFormat::Html, options)
    }

    /// XML for this subtree.
    #[must_use]
    pub fn xml(self, options: &RenderOptions) -> String {
        self.render_or_empty(RenderFormat::Xml, options)
    }

    /// CommonMark for this subtree, wrapped at 80 columns.
    #[must_use]
    pub fn commonmark(self, options: &RenderOptions) -> String {
        self.render_or_empty(RenderFormat::CommonMark, options)
    }

    /// LaTeX for this subtree, wrapped at 80 columns.
    #[must_use]
    pub fn latex(self, options: &RenderOptions) -> String {
        self.render_or_empty(RenderFormat::Latex, options)
    }

    fn render_or_empty(self, format: RenderFormat, options: &RenderOptions) -> String {
        render(self, format, options).unwrap_or_else(|e| {
            tracing::warn!(%format, node = %self.id(), error = %e, "Rendering failed");
            String::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_renders_every_format() {
        let doc = Document::from_markdown_text("").unwrap();
        let options = RenderOptions::default();
        assert_eq!(doc.root().html(&options), "");
        assert_eq!(doc.root().commonmark(&options), "");
        assert!(doc.root().xml(&options).contains("<document"));
        for format in [
            RenderFormat::Html,
            RenderFormat::Xml,
            RenderFormat::CommonMark,
            RenderFormat::Latex,
        ] {
            assert!(render(doc.root(), format, &options).is_ok(), "{format}");
        }
    }

    #[test]
    fn test_subtree_rendering() {
        let doc = Document::from_markdown_text("# Title\n\nBody *text*\n").unwrap();
        let para = doc.root().children()[1];
        let options = RenderOptions::default();
        assert_eq!(para.html(&options), "<p>Body <em>text</em></p>\n");
        assert_eq!(para.commonmark(&options), "Body *text*\n");

        let emph = para.last_child().unwrap();
        assert_eq!(emph.node_type(), NodeType::Emphasis);
        assert_eq!(emph.html(&options), "<em>text</em>");
    }

    #[test]
    fn test_rendering_does_not_mutate() {
        let doc = Document::from_markdown_text("- a\n- b\n").unwrap();
        let options = RenderOptions::default();
        let before = doc.root().to_string();
        let first = doc.root().html(&options);
        let second = doc.root().html(&options);
        assert_eq!(first, second);
        assert_eq!(doc.root().to_string(), before);
    }

    #[test]
    fn test_markdown_to_html() {
        let html = markdown_to_html("Hello *world*", &RenderOptions::default());
        assert_eq!(html, "<p>Hello <em>world</em></p>\n");
    }

    #[test]
    fn test_no_breaks_disables_wrapping() {
        let long = "word ".repeat(30);
        let doc = Document::from_markdown_text(&long).unwrap();
        let wrapped = doc.root().commonmark(&RenderOptions::default());
        assert!(wrapped.lines().count() > 1);
        let unwrapped = doc.root().commonmark(&RenderOptions::new().with_no_breaks());
        assert_eq!(unwrapped.lines().count(), 1);
    }

    #[test]
    fn test_custom_width() {
        let doc = Document::from_markdown_text("aaa bbb ccc ddd\n").unwrap();
        let out = render_with_width(
            doc.root(),
            RenderFormat::CommonMark,
            &RenderOptions::default(),
            8,
        )
        .unwrap();
        assert_eq!(out, "aaa bbb\nccc ddd\n");
    }

    #[test]
    fn test_format_names() {
        assert_eq!(RenderFormat::CommonMark.to_string(), "commonmark");
        assert_eq!(RenderFormat::Latex.as_str(), "latex");
    }
}
