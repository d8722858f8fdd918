//! Mutable CommonMark document tree with pluggable renderers.
//!
//! A [`Document`] owns every node of one tree. Nodes are addressed by
//! [`NodeId`] and read through [`NodeRef`] views, which borrow the document
//! and so cannot outlive it. Properties are edited through [`NodeMut`];
//! writing a property that does not apply to a node's type fails with
//! [`TreeError::InvalidProperty`] and leaves the node unchanged.
//!
//! # Architecture
//!
//! - Parsing: `pulldown-cmark` events are assembled into the arena tree,
//!   with source positions for every node.
//! - Rendering: one walker drives a format backend over enter/exit edges:
//!   - HTML, with raw HTML and dangerous URLs suppressed unless `unsafe`
//!   - XML following the CommonMark DTD
//!   - CommonMark, wrapped at 80 columns
//!   - LaTeX, wrapped at 80 columns
//!
//!   Any node can be rendered, not only the root.
//!
//! # Example
//!
//! ```
//! use mdtree::{Document, NodeType, RenderOptions};
//!
//! let mut doc = Document::from_markdown_text("# Title\n\nBody").unwrap();
//! let heading = doc.root().first_child().unwrap();
//! assert_eq!(heading.node_type(), NodeType::Heading);
//! assert_eq!(heading.heading_level(), Some(1));
//!
//! let id = heading.id();
//! doc.get_mut(id).unwrap().set_heading_level(2).unwrap();
//!
//! let options = RenderOptions::default();
//! assert_eq!(doc.root().commonmark(&options), "## Title\n\nBody\n");
//! assert_eq!(doc.root().html(&options), "<h2>Title</h2>\n<p>Body</p>\n");
//! ```

mod builder;
mod error;
mod iter;
mod node;
mod node_ref;
mod options;
mod position;
mod render;
mod tree;

pub use error::{ParseError, RenderError, TreeError};
pub use iter::{Children, Descendants, NodeEdge, Traverse};
pub use node::{ListDelim, ListType, NodeType};
pub use node_ref::{NodeMut, NodeRef};
pub use options::RenderOptions;
pub use position::Position;
pub use render::{
    DEFAULT_WIDTH, RenderFormat, escape_html, markdown_to_html, render, render_with_width,
};
pub use tree::{Document, NodeId};
