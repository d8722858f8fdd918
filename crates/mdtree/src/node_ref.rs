//! Borrowed node views.

use std::fmt;

use crate::error::TreeError;
use crate::iter::{Children, Descendants, Traverse};
use crate::node::{ListDelim, ListType, NodeType, NodeValue};
use crate::position::Position;
use crate::tree::{Document, NodeData, NodeId};

/// Read-only view of one node in a [`Document`].
///
/// Views are `Copy` and borrow the document; dropping a view never releases
/// anything. Two views are equal when they point at the same node of the same
/// document.
#[derive(Clone, Copy)]
pub struct NodeRef<'doc> {
    doc: &'doc Document,
    id: NodeId,
}

impl<'doc> NodeRef<'doc> {
    pub(crate) fn new(doc: &'doc Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    fn data(self) -> &'doc NodeData {
        self.doc.data(self.id)
    }

    fn view(self, id: Option<NodeId>) -> Option<Self> {
        id.map(|id| Self::new(self.doc, id))
    }

    /// Id of this node, for use with the editing API of [`Document`].
    #[must_use]
    pub fn id(self) -> NodeId {
        self.id
    }

    /// The document this node belongs to.
    #[must_use]
    pub fn document(self) -> &'doc Document {
        self.doc
    }

    #[must_use]
    pub fn node_type(self) -> NodeType {
        self.data().value.node_type()
    }

    /// Lowercase type name (e.g., `"block_quote"`).
    #[must_use]
    pub fn type_string(self) -> &'static str {
        self.node_type().as_str()
    }

    /// Whether this is the document root.
    #[must_use]
    pub fn is_root(self) -> bool {
        self.id == NodeId::ROOT
    }

    /// Start of the node in the source.
    #[must_use]
    pub fn start(self) -> Position {
        self.data().start
    }

    /// End of the node in the source (inclusive).
    #[must_use]
    pub fn end(self) -> Position {
        self.data().end
    }

    /// Text payload of `Text`, `Code`, `CodeBlock`, `HtmlBlock` and `HtmlInline` nodes.
    #[must_use]
    pub fn literal(self) -> Option<&'doc str> {
        self.data().value.literal()
    }

    /// Level (1-6) of a `Heading`.
    #[must_use]
    pub fn heading_level(self) -> Option<u8> {
        match self.data().value {
            NodeValue::Heading(level) => Some(level),
            _ => None,
        }
    }

    #[must_use]
    pub fn list_type(self) -> Option<ListType> {
        self.data().value.list().map(|list| list.list_type)
    }

    /// Number of the first item of a `List` (`0` for bullet lists).
    #[must_use]
    pub fn list_start(self) -> Option<u32> {
        self.data().value.list().map(|list| list.start)
    }

    /// Delimiter of an ordered `List`.
    #[must_use]
    pub fn list_delim(self) -> Option<ListDelim> {
        self.data().value.list().and_then(|list| list.delim)
    }

    /// Marker character (`-`, `+` or `*`) of a bullet `List`.
    #[must_use]
    pub fn list_bullet(self) -> Option<char> {
        self.data()
            .value
            .list()
            .filter(|list| list.list_type == ListType::Bullet)
            .map(|list| list.bullet)
    }

    #[must_use]
    pub fn list_tight(self) -> Option<bool> {
        self.data().value.list().map(|list| list.tight)
    }

    /// Info string of a fenced `CodeBlock`.
    #[must_use]
    pub fn fence_info(self) -> Option<&'doc str> {
        match &self.data().value {
            NodeValue::CodeBlock(code) => code.info.as_deref(),
            _ => None,
        }
    }

    /// Destination of a `Link` or `Image`.
    #[must_use]
    pub fn url(self) -> Option<&'doc str> {
        self.data().value.link().map(|link| link.url.as_str())
    }

    /// Title of a `Link` or `Image`.
    #[must_use]
    pub fn title(self) -> Option<&'doc str> {
        self.data().value.link().map(|link| link.title.as_str())
    }

    /// Raw text emitted before the children of a custom node.
    #[must_use]
    pub fn on_enter(self) -> Option<&'doc str> {
        self.data().value.custom().map(|custom| custom.on_enter.as_str())
    }

    /// Raw text emitted after the children of a custom node.
    #[must_use]
    pub fn on_exit(self) -> Option<&'doc str> {
        self.data().value.custom().map(|custom| custom.on_exit.as_str())
    }

    #[must_use]
    pub fn parent(self) -> Option<Self> {
        self.view(self.data().parent)
    }

    #[must_use]
    pub fn first_child(self) -> Option<Self> {
        self.view(self.data().first_child)
    }

    #[must_use]
    pub fn last_child(self) -> Option<Self> {
        self.view(self.data().last_child)
    }

    #[must_use]
    pub fn next_sibling(self) -> Option<Self> {
        self.view(self.data().next)
    }

    #[must_use]
    pub fn previous_sibling(self) -> Option<Self> {
        self.view(self.data().prev)
    }

    /// Direct children in document order, collected into a new `Vec`.
    #[must_use]
    pub fn children(self) -> Vec<Self> {
        self.children_iter().collect()
    }

    /// Iterator over direct children in document order.
    #[must_use]
    pub fn children_iter(self) -> Children<'doc> {
        Children::new(self.first_child())
    }

    /// This node followed by all of its descendants, in document order.
    #[must_use]
    pub fn descendants(self) -> Descendants<'doc> {
        Descendants::new(self)
    }

    /// Enter/exit walk over this subtree.
    #[must_use]
    pub fn traverse(self) -> Traverse<'doc> {
        Traverse::new(self)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("type", &self.node_type())
            .field("start", &self.start())
            .field("end", &self.end())
            .finish()
    }
}

/// Debug dump of the subtree: type, literal and nested children.
impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{\n {}[", self.type_string(), self.literal().unwrap_or_default())?;
        for (i, child) in self.children_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{child}")?;
        }
        f.write_str("] \n}")
    }
}

/// Mutable handle to one node of a [`Document`].
///
/// Holding a `NodeMut` borrows the whole document mutably, so no views can
/// observe a node while its properties change.
pub struct NodeMut<'doc> {
    doc: &'doc mut Document,
    id: NodeId,
}

impl<'doc> NodeMut<'doc> {
    pub(crate) fn new(doc: &'doc mut Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.value().node_type()
    }

    /// Read-only view of this node.
    #[must_use]
    pub fn as_ref(&self) -> NodeRef<'_> {
        NodeRef::new(self.doc, self.id)
    }

    fn value(&self) -> &NodeValue {
        &self.doc.data(self.id).value
    }

    fn value_mut(&mut self) -> &mut NodeValue {
        &mut self.doc.data_mut(self.id).value
    }

    fn invalid(&self, property: &'static str) -> TreeError {
        TreeError::InvalidProperty {
            node_type: self.node_type(),
            property,
        }
    }

    /// Set the literal text; `None` clears it.
    pub fn set_literal(&mut self, literal: Option<&str>) -> Result<(), TreeError> {
        let err = self.invalid("literal");
        let slot = self.value_mut().literal_mut().ok_or(err)?;
        *slot = literal.unwrap_or_default().to_owned();
        Ok(())
    }

    /// Set the level of a `Heading` (1-6).
    pub fn set_heading_level(&mut self, level: u8) -> Result<(), TreeError> {
        let err = self.invalid("heading_level");
        let NodeValue::Heading(ref mut current) = *self.value_mut() else {
            return Err(err);
        };
        if !(1..=6).contains(&level) {
            return Err(TreeError::InvalidValue {
                property: "heading_level",
                reason: format!("{level} is outside 1-6"),
            });
        }
        *current = level;
        Ok(())
    }

    /// Set the list type. Switching to ordered gives the list a `.` delimiter
    /// and a start of 1 if it had none.
    pub fn set_list_type(&mut self, list_type: ListType) -> Result<(), TreeError> {
        let err = self.invalid("list_type");
        let list = self.value_mut().list_mut().ok_or(err)?;
        list.list_type = list_type;
        match list_type {
            ListType::Bullet => list.delim = None,
            ListType::Ordered => {
                list.delim.get_or_insert(ListDelim::Period);
                if list.start == 0 {
                    list.start = 1;
                }
            }
        }
        Ok(())
    }

    pub fn set_list_start(&mut self, start: u32) -> Result<(), TreeError> {
        let err = self.invalid("list_start");
        self.value_mut().list_mut().ok_or(err)?.start = start;
        Ok(())
    }

    /// Set the delimiter of an ordered list.
    pub fn set_list_delim(&mut self, delim: ListDelim) -> Result<(), TreeError> {
        let err = self.invalid("list_delim");
        let list = self.value_mut().list_mut().ok_or(err)?;
        if list.list_type == ListType::Bullet {
            return Err(TreeError::InvalidValue {
                property: "list_delim",
                reason: "bullet lists have no delimiter".to_owned(),
            });
        }
        list.delim = Some(delim);
        Ok(())
    }

    pub fn set_list_tight(&mut self, tight: bool) -> Result<(), TreeError> {
        let err = self.invalid("list_tight");
        self.value_mut().list_mut().ok_or(err)?.tight = tight;
        Ok(())
    }

    /// Set the info string of a `CodeBlock`. `Some` makes the block fenced,
    /// `None` makes it indented.
    pub fn set_fence_info(&mut self, info: Option<&str>) -> Result<(), TreeError> {
        let err = self.invalid("fence_info");
        let NodeValue::CodeBlock(ref mut code) = *self.value_mut() else {
            return Err(err);
        };
        code.info = info.map(str::to_owned);
        Ok(())
    }

    /// Set the destination of a `Link` or `Image`; `None` clears it.
    pub fn set_url(&mut self, url: Option<&str>) -> Result<(), TreeError> {
        let err = self.invalid("url");
        self.value_mut().link_mut().ok_or(err)?.url = url.unwrap_or_default().to_owned();
        Ok(())
    }

    /// Set the title of a `Link` or `Image`; `None` clears it.
    pub fn set_title(&mut self, title: Option<&str>) -> Result<(), TreeError> {
        let err = self.invalid("title");
        self.value_mut().link_mut().ok_or(err)?.title = title.unwrap_or_default().to_owned();
        Ok(())
    }

    pub fn set_on_enter(&mut self, text: Option<&str>) -> Result<(), TreeError> {
        let err = self.invalid("on_enter");
        self.value_mut().custom_mut().ok_or(err)?.on_enter = text.unwrap_or_default().to_owned();
        Ok(())
    }

    pub fn set_on_exit(&mut self, text: Option<&str>) -> Result<(), TreeError> {
        let err = self.invalid("on_exit");
        self.value_mut().custom_mut().ok_or(err)?.on_exit = text.unwrap_or_default().to_owned();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(markdown: &str) -> Document {
        Document::from_markdown_text(markdown).unwrap()
    }

    fn first_of_type(doc: &Document, node_type: NodeType) -> NodeId {
        doc.root()
            .descendants()
            .find(|n| n.node_type() == node_type)
            .unwrap()
            .id()
    }

    #[test]
    fn test_heading_level_roundtrip() {
        let mut doc = parse("# Title");
        let heading = first_of_type(&doc, NodeType::Heading);
        for level in 1..=6 {
            doc.get_mut(heading).unwrap().set_heading_level(level).unwrap();
            assert_eq!(doc.get(heading).unwrap().heading_level(), Some(level));
        }
    }

    #[test]
    fn test_heading_level_on_text_fails() {
        let mut doc = parse("# Title");
        let text = first_of_type(&doc, NodeType::Text);
        let err = doc.get_mut(text).unwrap().set_heading_level(2).unwrap_err();
        assert_eq!(
            err,
            TreeError::InvalidProperty {
                node_type: NodeType::Text,
                property: "heading_level",
            }
        );
        assert_eq!(doc.get(text).unwrap().heading_level(), None);
    }

    #[test]
    fn test_heading_level_out_of_range() {
        let mut doc = parse("# Title");
        let heading = first_of_type(&doc, NodeType::Heading);
        for level in [0, 7] {
            assert!(matches!(
                doc.get_mut(heading).unwrap().set_heading_level(level),
                Err(TreeError::InvalidValue { .. })
            ));
        }
        assert_eq!(doc.get(heading).unwrap().heading_level(), Some(1));
    }

    #[test]
    fn test_inapplicable_getters_return_none() {
        let doc = parse("Body");
        let para = doc.root().first_child().unwrap();
        assert_eq!(para.literal(), None);
        assert_eq!(para.heading_level(), None);
        assert_eq!(para.list_type(), None);
        assert_eq!(para.list_start(), None);
        assert_eq!(para.fence_info(), None);
        assert_eq!(para.url(), None);
        assert_eq!(para.title(), None);
        assert_eq!(para.on_enter(), None);
    }

    #[test]
    fn test_literal_setter() {
        let mut doc = parse("Body");
        let text = first_of_type(&doc, NodeType::Text);
        doc.get_mut(text).unwrap().set_literal(Some("Changed")).unwrap();
        assert_eq!(doc.get(text).unwrap().literal(), Some("Changed"));

        doc.get_mut(text).unwrap().set_literal(None).unwrap();
        assert_eq!(doc.get(text).unwrap().literal(), Some(""));

        let para = first_of_type(&doc, NodeType::Paragraph);
        assert!(matches!(
            doc.get_mut(para).unwrap().set_literal(Some("x")),
            Err(TreeError::InvalidProperty { property: "literal", .. })
        ));
    }

    #[test]
    fn test_list_setters() {
        let mut doc = parse("- a\n- b\n");
        let list = first_of_type(&doc, NodeType::List);
        {
            let view = doc.get(list).unwrap();
            assert_eq!(view.list_type(), Some(ListType::Bullet));
            assert_eq!(view.list_delim(), None);
        }

        let mut node = doc.get_mut(list).unwrap();
        node.set_list_type(ListType::Ordered).unwrap();
        node.set_list_start(5).unwrap();
        node.set_list_delim(ListDelim::Paren).unwrap();
        node.set_list_tight(false).unwrap();

        let view = doc.get(list).unwrap();
        assert_eq!(view.list_type(), Some(ListType::Ordered));
        assert_eq!(view.list_start(), Some(5));
        assert_eq!(view.list_delim(), Some(ListDelim::Paren));
        assert_eq!(view.list_tight(), Some(false));
    }

    #[test]
    fn test_list_delim_on_bullet_list() {
        let mut doc = parse("- a\n");
        let list = first_of_type(&doc, NodeType::List);
        assert!(matches!(
            doc.get_mut(list).unwrap().set_list_delim(ListDelim::Period),
            Err(TreeError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_list_bullet() {
        let doc = parse("* a\n\n1. b\n");
        let lists: Vec<_> = doc.root().children();
        assert_eq!(lists[0].list_bullet(), Some('*'));
        assert_eq!(lists[1].list_bullet(), None);
    }

    #[test]
    fn test_link_setters() {
        let mut doc = parse("[text](http://a.example \"A\")");
        let link = first_of_type(&doc, NodeType::Link);
        assert_eq!(doc.get(link).unwrap().url(), Some("http://a.example"));
        assert_eq!(doc.get(link).unwrap().title(), Some("A"));

        let mut node = doc.get_mut(link).unwrap();
        node.set_url(Some("http://b.example")).unwrap();
        node.set_title(None).unwrap();

        assert_eq!(doc.get(link).unwrap().url(), Some("http://b.example"));
        assert_eq!(doc.get(link).unwrap().title(), Some(""));

        let text = first_of_type(&doc, NodeType::Text);
        assert!(doc.get_mut(text).unwrap().set_url(Some("x")).is_err());
    }

    #[test]
    fn test_fence_info_setter() {
        let mut doc = parse("    indented\n");
        let code = first_of_type(&doc, NodeType::CodeBlock);
        assert_eq!(doc.get(code).unwrap().fence_info(), None);

        doc.get_mut(code).unwrap().set_fence_info(Some("rust")).unwrap();
        assert_eq!(doc.get(code).unwrap().fence_info(), Some("rust"));

        let root = doc.root().id();
        assert!(doc.get_mut(root).unwrap().set_fence_info(Some("x")).is_err());
    }

    #[test]
    fn test_custom_setters() {
        let mut doc = Document::new();
        let custom = doc.create_node(NodeType::CustomBlock).unwrap();
        let mut node = doc.get_mut(custom).unwrap();
        node.set_on_enter(Some("<div>")).unwrap();
        node.set_on_exit(Some("</div>")).unwrap();

        let view = doc.get(custom).unwrap();
        assert_eq!(view.on_enter(), Some("<div>"));
        assert_eq!(view.on_exit(), Some("</div>"));
    }

    #[test]
    fn test_identity_equality() {
        let doc = parse("a\n\nb");
        let first = doc.root().children()[0];
        let again = doc.root().first_child().unwrap();
        let second = doc.root().children()[1];
        assert_eq!(first, again);
        assert_ne!(first, second);

        let other = parse("a\n\nb");
        assert_ne!(doc.root(), other.root());
    }

    #[test]
    fn test_children_parent_is_self() {
        let doc = parse("# Title\n\n> quote\n\n- a\n- *b*\n");
        for node in doc.root().descendants() {
            for child in node.children() {
                assert_eq!(child.parent(), Some(node));
            }
        }
    }

    #[test]
    fn test_display_dump() {
        let doc = parse("Hi");
        assert_eq!(
            doc.root().to_string(),
            "document {\n [paragraph {\n [text {\n Hi[] \n}] \n}] \n}"
        );
    }
}
