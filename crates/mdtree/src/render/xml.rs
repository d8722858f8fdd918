//! XML backend following the CommonMark DTD.

use std::fmt::{self, Write};

use quick_xml::escape::escape;

use super::{Backend, Walk};
use crate::node::{ListDelim, ListType, NodeType};
use crate::node_ref::NodeRef;
use crate::options::RenderOptions;

const HEADER: &str =
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE document SYSTEM \"CommonMark.dtd\">\n";
const NAMESPACE: &str = "http://commonmark.org/xml/1.0";

pub(crate) struct XmlBackend {
    out: String,
    indent: usize,
    source_pos: bool,
}

impl XmlBackend {
    pub(crate) fn new(options: &RenderOptions) -> Self {
        Self {
            out: HEADER.to_owned(),
            indent: 0,
            source_pos: options.source_pos,
        }
    }

    fn attr(&mut self, name: &str, value: &str) -> fmt::Result {
        write!(self.out, " {name}=\"{}\"", escape(value))
    }

    /// Element body for nodes whose content is a literal string.
    fn literal_body(&mut self, node: NodeRef<'_>) -> fmt::Result {
        write!(
            self.out,
            " xml:space=\"preserve\">{}</{}",
            escape(node.literal().unwrap_or_default()),
            node.type_string()
        )
    }
}

impl Backend for XmlBackend {
    fn enter(&mut self, node: NodeRef<'_>) -> Result<Walk, fmt::Error> {
        write!(self.out, "{:indent$}<{}", "", node.type_string(), indent = self.indent)?;
        if self.source_pos && node.start().is_known() {
            write!(self.out, " sourcepos=\"{}-{}\"", node.start(), node.end())?;
        }

        let mut literal = false;
        match node.node_type() {
            NodeType::Document => self.attr("xmlns", NAMESPACE)?,
            NodeType::Text | NodeType::Code | NodeType::HtmlBlock | NodeType::HtmlInline => {
                self.literal_body(node)?;
                literal = true;
            }
            NodeType::CodeBlock => {
                if let Some(info) = node.fence_info().filter(|info| !info.is_empty()) {
                    self.attr("info", info)?;
                }
                self.literal_body(node)?;
                literal = true;
            }
            NodeType::List => {
                if node.list_type() == Some(ListType::Ordered) {
                    self.out.push_str(" type=\"ordered\"");
                    write!(self.out, " start=\"{}\"", node.list_start().unwrap_or(1))?;
                    match node.list_delim() {
                        Some(ListDelim::Paren) => self.out.push_str(" delim=\"paren\""),
                        Some(ListDelim::Period) => self.out.push_str(" delim=\"period\""),
                        None => {}
                    }
                } else {
                    self.out.push_str(" type=\"bullet\"");
                }
                write!(self.out, " tight=\"{}\"", node.list_tight().unwrap_or(false))?;
            }
            NodeType::Heading => {
                write!(self.out, " level=\"{}\"", node.heading_level().unwrap_or(1))?;
            }
            NodeType::CustomBlock | NodeType::CustomInline => {
                self.attr("on_enter", node.on_enter().unwrap_or_default())?;
                self.attr("on_exit", node.on_exit().unwrap_or_default())?;
            }
            NodeType::Link | NodeType::Image => {
                self.attr("destination", node.url().unwrap_or_default())?;
                self.attr("title", node.title().unwrap_or_default())?;
            }
            _ => {}
        }

        if node.first_child().is_some() {
            self.indent += 2;
        } else if !literal {
            self.out.push_str(" /");
        }
        self.out.push_str(">\n");
        Ok(Walk::Descend)
    }

    fn exit(&mut self, node: NodeRef<'_>) -> fmt::Result {
        if node.first_child().is_some() {
            self.indent = self.indent.saturating_sub(2);
            writeln!(self.out, "{:indent$}</{}>", "", node.type_string(), indent = self.indent)?;
        }
        Ok(())
    }

    fn finish(self) -> String {
        self.out
    }
}
