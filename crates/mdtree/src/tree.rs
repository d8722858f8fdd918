//! Arena-backed document tree.
//!
//! A [`Document`] owns every node of one tree in a single arena. Nodes are
//! addressed by [`NodeId`] and observed through borrowed [`NodeRef`] views or
//! mutated through [`NodeMut`]. Views borrow the document, so none of them can
//! outlive it, and the arena is released as a unit when the document drops.

use std::fmt;
use std::path::Path;

use crate::builder;
use crate::error::{ParseError, TreeError};
use crate::node::{NodeType, NodeValue};
use crate::node_ref::{NodeMut, NodeRef};
use crate::options::RenderOptions;
use crate::position::Position;

/// Index of a node within its [`Document`].
///
/// Ids are plain arena indices and carry no reference to the document that
/// issued them. Passing an id to a different document is only detected when
/// the index is out of range there ([`TreeError::UnknownNode`]); an in-range
/// id silently addresses whatever node that document stores at the index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) const ROOT: Self = Self(0);

    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct NodeData {
    pub(crate) value: NodeValue,
    pub(crate) start: Position,
    pub(crate) end: Position,
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

impl NodeData {
    fn new(value: NodeValue, start: Position, end: Position) -> Self {
        Self {
            value,
            start,
            end,
            parent: None,
            first_child: None,
            last_child: None,
            prev: None,
            next: None,
        }
    }
}

/// A parsed (or programmatically built) markdown document.
///
/// The root is always the single `Document` node; it has no parent.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    /// Create a document with an empty root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new(
                NodeValue::Document,
                Position::new(1, 1),
                Position::new(1, 1),
            )],
        }
    }

    /// Parse markdown text with default options.
    ///
    /// Always succeeds for `&str` input; the `Option` mirrors
    /// [`from_file`](Self::from_file).
    ///
    /// # Example
    ///
    /// ```
    /// use mdtree::{Document, NodeType};
    ///
    /// let doc = Document::from_markdown_text("# Title\n\nBody").unwrap();
    /// let kinds: Vec<_> = doc.root().children().iter().map(|n| n.node_type()).collect();
    /// assert_eq!(kinds, [NodeType::Heading, NodeType::Paragraph]);
    /// ```
    pub fn from_markdown_text(text: &str) -> Option<Self> {
        Some(Self::parse(text, &RenderOptions::default()))
    }

    /// Parse a markdown file with default options.
    ///
    /// Returns `None` if the file cannot be read or is not valid UTF-8.
    pub fn from_file(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        match Self::parse_file(path, &RenderOptions::default()) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %e,
                    "Failed to parse markdown file"
                );
                None
            }
        }
    }

    /// Parse markdown text.
    ///
    /// Reads the `smart` and `normalize` flags of `options`.
    #[must_use]
    pub fn parse(text: &str, options: &RenderOptions) -> Self {
        builder::build(text, options)
    }

    /// Parse markdown bytes.
    ///
    /// Invalid UTF-8 is an error unless `validate_utf8` is set, in which case
    /// invalid sequences are replaced with U+FFFD.
    pub fn parse_bytes(bytes: &[u8], options: &RenderOptions) -> Result<Self, ParseError> {
        if options.validate_utf8 {
            return Ok(Self::parse(&String::from_utf8_lossy(bytes), options));
        }
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::parse(text, options))
    }

    /// Read and parse a markdown file. Blocks on file I/O.
    pub fn parse_file(path: impl AsRef<Path>, options: &RenderOptions) -> Result<Self, ParseError> {
        let bytes = std::fs::read(path)?;
        Self::parse_bytes(&bytes, options)
    }

    /// The root `Document` node.
    #[must_use]
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef::new(self, NodeId::ROOT)
    }

    /// Mutable handle to the root node.
    pub fn root_mut(&mut self) -> NodeMut<'_> {
        NodeMut::new(self, NodeId::ROOT)
    }

    /// View of the node with the given id, if it belongs to this document.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.contains(id).then(|| NodeRef::new(self, id))
    }

    /// Mutable handle to the node with the given id.
    pub fn get_mut(&mut self, id: NodeId) -> Option<NodeMut<'_>> {
        if self.contains(id) {
            Some(NodeMut::new(self, id))
        } else {
            None
        }
    }

    /// Number of nodes allocated in the arena, including detached ones.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Allocate a new detached node of the given type.
    ///
    /// The node has no source position and must be linked into the tree with
    /// [`append_child`](Self::append_child) or a sibling insertion to become
    /// part of the document.
    pub fn create_node(&mut self, node_type: NodeType) -> Result<NodeId, TreeError> {
        if node_type == NodeType::Document {
            return Err(TreeError::InvalidChild {
                parent: NodeType::Document,
                child: NodeType::Document,
            });
        }
        Ok(self.alloc(
            NodeValue::new(node_type),
            Position::default(),
            Position::default(),
        ))
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_insert(parent, child)?;
        self.unlink(child);
        self.link_last(parent, child);
        Ok(())
    }

    /// Move `child` to the front of `parent`'s children.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_insert(parent, child)?;
        self.unlink(child);
        let old_first = self.data(parent).first_child;
        {
            let data = self.data_mut(child);
            data.parent = Some(parent);
            data.next = old_first;
        }
        match old_first {
            Some(first) => self.data_mut(first).prev = Some(child),
            None => self.data_mut(parent).last_child = Some(child),
        }
        self.data_mut(parent).first_child = Some(child);
        Ok(())
    }

    /// Move `node` directly before `anchor`.
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) -> Result<(), TreeError> {
        let parent = self.sibling_parent(anchor, node)?;
        if anchor == node {
            return Ok(());
        }
        self.check_insert(parent, node)?;
        self.unlink(node);
        let prev = self.data(anchor).prev;
        {
            let data = self.data_mut(node);
            data.parent = Some(parent);
            data.prev = prev;
            data.next = Some(anchor);
        }
        self.data_mut(anchor).prev = Some(node);
        match prev {
            Some(prev) => self.data_mut(prev).next = Some(node),
            None => self.data_mut(parent).first_child = Some(node),
        }
        Ok(())
    }

    /// Move `node` directly after `anchor`.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> Result<(), TreeError> {
        let parent = self.sibling_parent(anchor, node)?;
        if anchor == node {
            return Ok(());
        }
        self.check_insert(parent, node)?;
        self.unlink(node);
        let next = self.data(anchor).next;
        {
            let data = self.data_mut(node);
            data.parent = Some(parent);
            data.prev = Some(anchor);
            data.next = next;
        }
        self.data_mut(anchor).next = Some(node);
        match next {
            Some(next) => self.data_mut(next).prev = Some(node),
            None => self.data_mut(parent).last_child = Some(node),
        }
        Ok(())
    }

    /// Detach a node (with its subtree) from the tree.
    ///
    /// The subtree stays allocated until the document drops and can be
    /// re-inserted later.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        if !self.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }
        if id == NodeId::ROOT {
            return Err(TreeError::RootMutation);
        }
        self.unlink(id);
        Ok(())
    }

    /// Merge adjacent text siblings throughout the tree.
    pub fn normalize(&mut self) {
        let mut current = self.data(NodeId::ROOT).first_child;
        let mut stack = Vec::new();
        while let Some(id) = current {
            if matches!(self.data(id).value, NodeValue::Text(_)) {
                self.merge_following_text(id);
            }
            if let Some(next) = self.data(id).next {
                stack.push(next);
            }
            current = self.data(id).first_child.or_else(|| stack.pop());
        }
    }

    fn merge_following_text(&mut self, id: NodeId) {
        while let Some(next) = self.data(id).next {
            let NodeValue::Text(ref text) = self.data(next).value else {
                break;
            };
            let text = text.clone();
            let next_end = self.data(next).end;
            self.unlink(next);
            let data = self.data_mut(id);
            if let NodeValue::Text(ref mut literal) = data.value {
                literal.push_str(&text);
            }
            if next_end.is_known() {
                data.end = next_end;
            }
        }
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn alloc(&mut self, value: NodeValue, start: Position, end: Position) -> NodeId {
        self.nodes.push(NodeData::new(value, start, end));
        NodeId(self.nodes.len() - 1)
    }

    /// Link a detached node as the last child of `parent` without validation.
    pub(crate) fn link_last(&mut self, parent: NodeId, child: NodeId) {
        let old_last = self.data(parent).last_child;
        {
            let data = self.data_mut(child);
            data.parent = Some(parent);
            data.prev = old_last;
            data.next = None;
        }
        match old_last {
            Some(last) => self.data_mut(last).next = Some(child),
            None => self.data_mut(parent).first_child = Some(child),
        }
        self.data_mut(parent).last_child = Some(child);
    }

    fn unlink(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let data = self.data(id);
            (data.parent, data.prev, data.next)
        };
        match prev {
            Some(prev) => self.data_mut(prev).next = next,
            None => {
                if let Some(parent) = parent {
                    self.data_mut(parent).first_child = next;
                }
            }
        }
        match next {
            Some(next) => self.data_mut(next).prev = prev,
            None => {
                if let Some(parent) = parent {
                    self.data_mut(parent).last_child = prev;
                }
            }
        }
        let data = self.data_mut(id);
        data.parent = None;
        data.prev = None;
        data.next = None;
    }

    /// Validate that `child` may be inserted under `parent`.
    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        for id in [parent, child] {
            if !self.contains(id) {
                return Err(TreeError::UnknownNode(id));
            }
        }
        if child == NodeId::ROOT {
            return Err(TreeError::RootMutation);
        }
        let parent_type = self.data(parent).value.node_type();
        let child_type = self.data(child).value.node_type();
        if !parent_type.can_contain(child_type) {
            return Err(TreeError::InvalidChild {
                parent: parent_type,
                child: child_type,
            });
        }
        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == child {
                return Err(TreeError::WouldCycle(child));
            }
            ancestor = self.data(id).parent;
        }
        Ok(())
    }

    /// Parent of `anchor` for a sibling insertion of `node`.
    fn sibling_parent(&self, anchor: NodeId, node: NodeId) -> Result<NodeId, TreeError> {
        for id in [anchor, node] {
            if !self.contains(id) {
                return Err(TreeError::UnknownNode(id));
            }
        }
        if anchor == NodeId::ROOT || node == NodeId::ROOT {
            return Err(TreeError::RootMutation);
        }
        self.data(anchor).parent.ok_or(TreeError::Detached(anchor))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
