//! Tree iterators.

use crate::node_ref::NodeRef;

/// Iterator over the direct children of a node.
pub struct Children<'doc> {
    next: Option<NodeRef<'doc>>,
}

impl<'doc> Children<'doc> {
    pub(crate) fn new(first: Option<NodeRef<'doc>>) -> Self {
        Self { next: first }
    }
}

impl<'doc> Iterator for Children<'doc> {
    type Item = NodeRef<'doc>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.next_sibling();
        Some(current)
    }
}

/// One step of a [`Traverse`] walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeEdge<'doc> {
    /// The walk reaches the node, before any of its children.
    Enter(NodeRef<'doc>),
    /// The walk leaves the node, after all of its children.
    Exit(NodeRef<'doc>),
}

/// Depth-first enter/exit walk over a subtree.
///
/// Every node yields `Enter` then, after its subtree, `Exit`; leaf nodes yield
/// both back to back. The walk never leaves the starting node's subtree.
pub struct Traverse<'doc> {
    root: NodeRef<'doc>,
    last: Option<NodeEdge<'doc>>,
    next: Option<NodeEdge<'doc>>,
}

impl<'doc> Traverse<'doc> {
    pub(crate) fn new(root: NodeRef<'doc>) -> Self {
        Self {
            root,
            last: None,
            next: Some(NodeEdge::Enter(root)),
        }
    }

    /// Skip the children of the node that was just entered.
    ///
    /// The next edge becomes that node's `Exit`. Has no effect after an `Exit`.
    pub fn skip_children(&mut self) {
        if let Some(NodeEdge::Enter(node)) = self.last {
            self.next = Some(NodeEdge::Exit(node));
        }
    }

    fn successor(&self, edge: NodeEdge<'doc>) -> Option<NodeEdge<'doc>> {
        match edge {
            NodeEdge::Enter(node) => Some(match node.first_child() {
                Some(child) => NodeEdge::Enter(child),
                None => NodeEdge::Exit(node),
            }),
            NodeEdge::Exit(node) if node == self.root => None,
            NodeEdge::Exit(node) => match node.next_sibling() {
                Some(sibling) => Some(NodeEdge::Enter(sibling)),
                None => node.parent().map(NodeEdge::Exit),
            },
        }
    }
}

impl<'doc> Iterator for Traverse<'doc> {
    type Item = NodeEdge<'doc>;

    fn next(&mut self) -> Option<Self::Item> {
        let edge = self.next?;
        self.last = Some(edge);
        self.next = self.successor(edge);
        Some(edge)
    }
}

/// Pre-order iterator over a node and its descendants.
pub struct Descendants<'doc> {
    walk: Traverse<'doc>,
}

impl<'doc> Descendants<'doc> {
    pub(crate) fn new(root: NodeRef<'doc>) -> Self {
        Self {
            walk: Traverse::new(root),
        }
    }
}

impl<'doc> Iterator for Descendants<'doc> {
    type Item = NodeRef<'doc>;

    fn next(&mut self) -> Option<Self::Item> {
        self.walk.find_map(|edge| match edge {
            NodeEdge::Enter(node) => Some(node),
            NodeEdge::Exit(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, NodeType};

    fn edge_names<'a>(edges: impl Iterator<Item = NodeEdge<'a>>) -> Vec<String> {
        edges
            .map(|edge| match edge {
                NodeEdge::Enter(n) => format!("+{}", n.type_string()),
                NodeEdge::Exit(n) => format!("-{}", n.type_string()),
            })
            .collect()
    }

    fn parse(markdown: &str) -> Document {
        Document::from_markdown_text(markdown).unwrap()
    }

    #[test]
    fn test_traverse_order() {
        let doc = &parse("# *Hi*\n");
        assert_eq!(
            edge_names(doc.root().traverse()),
            vec![
                "+document",
                "+heading",
                "+emph",
                "+text",
                "-text",
                "-emph",
                "-heading",
                "-document",
            ]
        );
    }

    #[test]
    fn test_traverse_stays_in_subtree() {
        let doc = &parse("a\n\nb\n");
        let first = doc.root().first_child().unwrap();
        assert_eq!(
            edge_names(first.traverse()),
            vec!["+paragraph", "+text", "-text", "-paragraph"]
        );
    }

    #[test]
    fn test_skip_children() {
        let doc = &parse("*a* b\n");
        let mut walk = doc.root().traverse();
        let mut seen = Vec::new();
        while let Some(edge) = walk.next() {
            if let NodeEdge::Enter(node) = edge {
                seen.push(node.node_type());
                if node.node_type() == NodeType::Emphasis {
                    walk.skip_children();
                }
            }
        }
        assert_eq!(
            seen,
            vec![
                NodeType::Document,
                NodeType::Paragraph,
                NodeType::Emphasis,
                NodeType::Text,
            ]
        );
    }

    #[test]
    fn test_descendants_preorder() {
        let doc = &parse("> a\n");
        let types: Vec<_> = doc.root().descendants().map(|n| n.node_type()).collect();
        assert_eq!(
            types,
            vec![
                NodeType::Document,
                NodeType::BlockQuote,
                NodeType::Paragraph,
                NodeType::Text,
            ]
        );
    }

    #[test]
    fn test_exactly_one_document_node() {
        let doc = &parse("# T\n\n- a\n- b\n\n```\ncode\n```\n");
        let documents: Vec<_> = doc
            .root()
            .descendants()
            .filter(|n| n.node_type() == NodeType::Document)
            .collect();
        assert_eq!(documents, vec![doc.root()]);
        assert!(doc.root().parent().is_none());
    }
}
