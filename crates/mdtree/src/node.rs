//! Node type taxonomy and per-type payloads.

use std::fmt;

/// The closed set of CommonMark node types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    // Blocks
    Document,
    BlockQuote,
    List,
    Item,
    CodeBlock,
    HtmlBlock,
    CustomBlock,
    Paragraph,
    Heading,
    ThematicBreak,
    // Inlines
    Text,
    SoftBreak,
    LineBreak,
    Code,
    HtmlInline,
    CustomInline,
    Emphasis,
    Strong,
    Link,
    Image,
}

impl NodeType {
    /// Whether this is a block-level node type.
    #[must_use]
    pub const fn is_block(self) -> bool {
        matches!(
            self,
            Self::Document
                | Self::BlockQuote
                | Self::List
                | Self::Item
                | Self::CodeBlock
                | Self::HtmlBlock
                | Self::CustomBlock
                | Self::Paragraph
                | Self::Heading
                | Self::ThematicBreak
        )
    }

    /// Whether this is an inline node type.
    #[must_use]
    pub const fn is_inline(self) -> bool {
        !self.is_block()
    }

    /// Whether nodes of this type carry a `literal` text payload.
    #[must_use]
    pub const fn has_literal(self) -> bool {
        matches!(
            self,
            Self::CodeBlock | Self::HtmlBlock | Self::Text | Self::Code | Self::HtmlInline
        )
    }

    /// Whether a node of this type may have `child` as a direct child.
    #[must_use]
    pub const fn can_contain(self, child: Self) -> bool {
        if matches!(child, Self::Document) {
            return false;
        }
        match self {
            Self::Document | Self::BlockQuote | Self::Item => {
                child.is_block() && !matches!(child, Self::Item)
            }
            Self::List => matches!(child, Self::Item),
            Self::CustomBlock => true,
            Self::Paragraph
            | Self::Heading
            | Self::Emphasis
            | Self::Strong
            | Self::Link
            | Self::Image
            | Self::CustomInline => child.is_inline(),
            _ => false,
        }
    }

    /// Lowercase name of the type, as used in XML output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::BlockQuote => "block_quote",
            Self::List => "list",
            Self::Item => "item",
            Self::CodeBlock => "code_block",
            Self::HtmlBlock => "html_block",
            Self::CustomBlock => "custom_block",
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::ThematicBreak => "thematic_break",
            Self::Text => "text",
            Self::SoftBreak => "softbreak",
            Self::LineBreak => "linebreak",
            Self::Code => "code",
            Self::HtmlInline => "html_inline",
            Self::CustomInline => "custom_inline",
            Self::Emphasis => "emph",
            Self::Strong => "strong",
            Self::Link => "link",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ListType {
    #[default]
    Bullet,
    Ordered,
}

/// Delimiter following the number of an ordered list item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ListDelim {
    /// `1.`
    #[default]
    Period,
    /// `1)`
    Paren,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ListData {
    pub(crate) list_type: ListType,
    /// First item number; `0` for bullet lists.
    pub(crate) start: u32,
    pub(crate) delim: Option<ListDelim>,
    pub(crate) bullet: char,
    pub(crate) tight: bool,
}

impl Default for ListData {
    fn default() -> Self {
        Self {
            list_type: ListType::Bullet,
            start: 0,
            delim: None,
            bullet: '-',
            tight: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct CodeBlockData {
    /// Info string of a fenced block; `None` for indented blocks.
    pub(crate) info: Option<String>,
    pub(crate) literal: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct LinkData {
    pub(crate) url: String,
    pub(crate) title: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct CustomData {
    pub(crate) on_enter: String,
    pub(crate) on_exit: String,
}

/// Node type tag together with its type-specific properties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum NodeValue {
    Document,
    BlockQuote,
    List(ListData),
    Item,
    CodeBlock(CodeBlockData),
    HtmlBlock(String),
    CustomBlock(CustomData),
    Paragraph,
    Heading(u8),
    ThematicBreak,
    Text(String),
    SoftBreak,
    LineBreak,
    Code(String),
    HtmlInline(String),
    CustomInline(CustomData),
    Emphasis,
    Strong,
    Link(LinkData),
    Image(LinkData),
}

impl NodeValue {
    /// Empty value of the given type.
    pub(crate) fn new(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Document => Self::Document,
            NodeType::BlockQuote => Self::BlockQuote,
            NodeType::List => Self::List(ListData::default()),
            NodeType::Item => Self::Item,
            NodeType::CodeBlock => Self::CodeBlock(CodeBlockData::default()),
            NodeType::HtmlBlock => Self::HtmlBlock(String::new()),
            NodeType::CustomBlock => Self::CustomBlock(CustomData::default()),
            NodeType::Paragraph => Self::Paragraph,
            NodeType::Heading => Self::Heading(1),
            NodeType::ThematicBreak => Self::ThematicBreak,
            NodeType::Text => Self::Text(String::new()),
            NodeType::SoftBreak => Self::SoftBreak,
            NodeType::LineBreak => Self::LineBreak,
            NodeType::Code => Self::Code(String::new()),
            NodeType::HtmlInline => Self::HtmlInline(String::new()),
            NodeType::CustomInline => Self::CustomInline(CustomData::default()),
            NodeType::Emphasis => Self::Emphasis,
            NodeType::Strong => Self::Strong,
            NodeType::Link => Self::Link(LinkData::default()),
            NodeType::Image => Self::Image(LinkData::default()),
        }
    }

    pub(crate) fn node_type(&self) -> NodeType {
        match self {
            Self::Document => NodeType::Document,
            Self::BlockQuote => NodeType::BlockQuote,
            Self::List(_) => NodeType::List,
            Self::Item => NodeType::Item,
            Self::CodeBlock(_) => NodeType::CodeBlock,
            Self::HtmlBlock(_) => NodeType::HtmlBlock,
            Self::CustomBlock(_) => NodeType::CustomBlock,
            Self::Paragraph => NodeType::Paragraph,
            Self::Heading(_) => NodeType::Heading,
            Self::ThematicBreak => NodeType::ThematicBreak,
            Self::Text(_) => NodeType::Text,
            Self::SoftBreak => NodeType::SoftBreak,
            Self::LineBreak => NodeType::LineBreak,
            Self::Code(_) => NodeType::Code,
            Self::HtmlInline(_) => NodeType::HtmlInline,
            Self::CustomInline(_) => NodeType::CustomInline,
            Self::Emphasis => NodeType::Emphasis,
            Self::Strong => NodeType::Strong,
            Self::Link(_) => NodeType::Link,
            Self::Image(_) => NodeType::Image,
        }
    }

    pub(crate) fn literal(&self) -> Option<&str> {
        match self {
            Self::CodeBlock(code) => Some(&code.literal),
            Self::HtmlBlock(text)
            | Self::Text(text)
            | Self::Code(text)
            | Self::HtmlInline(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn literal_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::CodeBlock(code) => Some(&mut code.literal),
            Self::HtmlBlock(text)
            | Self::Text(text)
            | Self::Code(text)
            | Self::HtmlInline(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn list(&self) -> Option<&ListData> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    pub(crate) fn list_mut(&mut self) -> Option<&mut ListData> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    pub(crate) fn link(&self) -> Option<&LinkData> {
        match self {
            Self::Link(link) | Self::Image(link) => Some(link),
            _ => None,
        }
    }

    pub(crate) fn link_mut(&mut self) -> Option<&mut LinkData> {
        match self {
            Self::Link(link) | Self::Image(link) => Some(link),
            _ => None,
        }
    }

    pub(crate) fn custom(&self) -> Option<&CustomData> {
        match self {
            Self::CustomBlock(custom) | Self::CustomInline(custom) => Some(custom),
            _ => None,
        }
    }

    pub(crate) fn custom_mut(&mut self) -> Option<&mut CustomData> {
        match self {
            Self::CustomBlock(custom) | Self::CustomInline(custom) => Some(custom),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [NodeType; 20] = [
        NodeType::Document,
        NodeType::BlockQuote,
        NodeType::List,
        NodeType::Item,
        NodeType::CodeBlock,
        NodeType::HtmlBlock,
        NodeType::CustomBlock,
        NodeType::Paragraph,
        NodeType::Heading,
        NodeType::ThematicBreak,
        NodeType::Text,
        NodeType::SoftBreak,
        NodeType::LineBreak,
        NodeType::Code,
        NodeType::HtmlInline,
        NodeType::CustomInline,
        NodeType::Emphasis,
        NodeType::Strong,
        NodeType::Link,
        NodeType::Image,
    ];

    #[test]
    fn test_value_type_matches_tag() {
        for node_type in ALL {
            assert_eq!(NodeValue::new(node_type).node_type(), node_type);
        }
    }

    #[test]
    fn test_nothing_contains_document() {
        for node_type in ALL {
            assert!(!node_type.can_contain(NodeType::Document), "{node_type}");
        }
    }

    #[test]
    fn test_list_contains_only_items() {
        assert!(NodeType::List.can_contain(NodeType::Item));
        assert!(!NodeType::List.can_contain(NodeType::Paragraph));
        assert!(!NodeType::Document.can_contain(NodeType::Item));
    }

    #[test]
    fn test_inline_containers() {
        assert!(NodeType::Paragraph.can_contain(NodeType::Text));
        assert!(NodeType::Link.can_contain(NodeType::Emphasis));
        assert!(!NodeType::Paragraph.can_contain(NodeType::Paragraph));
        assert!(!NodeType::Text.can_contain(NodeType::Text));
    }

    #[test]
    fn test_literal_applicability() {
        let literal_types: Vec<_> = ALL.into_iter().filter(|t| t.has_literal()).collect();
        assert_eq!(
            literal_types,
            vec![
                NodeType::CodeBlock,
                NodeType::HtmlBlock,
                NodeType::Text,
                NodeType::Code,
                NodeType::HtmlInline,
            ]
        );
        for node_type in ALL {
            assert_eq!(
                NodeValue::new(node_type).literal().is_some(),
                node_type.has_literal()
            );
        }
    }

    #[test]
    fn test_type_strings() {
        assert_eq!(NodeType::BlockQuote.to_string(), "block_quote");
        assert_eq!(NodeType::Emphasis.as_str(), "emph");
        assert_eq!(NodeType::SoftBreak.as_str(), "softbreak");
    }
}
