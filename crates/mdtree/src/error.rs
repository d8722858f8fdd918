//! Error types for tree manipulation, parsing and rendering.

use std::str::Utf8Error;

use crate::node::NodeType;
use crate::tree::NodeId;

/// Error from reading or mutating the document tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TreeError {
    /// A property was written on a node type that does not carry it.
    #[error("property `{property}` is not applicable to {node_type} nodes")]
    InvalidProperty {
        /// Type of the node the property was written on.
        node_type: NodeType,
        /// Property name (e.g., "`heading_level`").
        property: &'static str,
    },

    /// A property value is outside its allowed range.
    #[error("invalid value for `{property}`: {reason}")]
    InvalidValue {
        /// Property name.
        property: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The parent node type cannot contain the child node type.
    #[error("{parent} nodes cannot contain {child} nodes")]
    InvalidChild {
        /// Type of the would-be parent.
        parent: NodeType,
        /// Type of the would-be child.
        child: NodeType,
    },

    /// The insertion would place a node inside its own subtree.
    #[error("node {0} cannot be inserted into its own subtree")]
    WouldCycle(NodeId),

    /// The document root cannot be moved, detached or given siblings.
    #[error("the document root cannot be moved or given siblings")]
    RootMutation,

    /// The anchor node has no parent to insert siblings into.
    #[error("node {0} is detached and cannot take siblings")]
    Detached(NodeId),

    /// The id does not belong to this document.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
}

/// Error while constructing a document from markdown input.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The input file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not valid UTF-8 and `validate_utf8` was not set.
    #[error("invalid UTF-8 in markdown input: {0}")]
    InvalidUtf8(#[from] Utf8Error),
}

/// Error while rendering a subtree.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Writing to the output buffer failed.
    #[error("failed to write rendered output")]
    Format(#[from] std::fmt::Error),
}
