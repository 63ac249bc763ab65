//! # pagemark-dom
//!
//! A small mutable DOM used by the pagemark highlight engine in place of a
//! browser document.
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → html5ever tree builder → DocumentSink → Document (slab of Nodes)
//! ```
//!
//! - [`parser`] drives html5ever; [`parse_document`] keeps the implied
//!   `html`/`head`/`body` wrappers, [`parse_html`] flattens them away for
//!   page fragments.
//! - [`Document`] owns every node in a slab. A [`NodeId`] is a plain slot
//!   index, so ids are `Copy` and can be held across mutations. Unwrapped
//!   and merged nodes give their slot back for reuse.
//! - [`NodeData`] is a closed sum type (`Document`, `Element`, `Text`) so
//!   tree walks match exhaustively instead of checking node types ad hoc.
//!
//! ## Quick Start
//!
//! ```
//! use pagemark_dom::parse_html;
//!
//! let mut doc = parse_html("<p>Hello world</p>");
//! let p = doc.children(doc.root())[0];
//! let text = doc.children(p)[0];
//!
//! let tail = doc.split_text(text, 6).unwrap();
//! assert_eq!(doc[tail].text(), Some("world"));
//! assert_eq!(doc.text_content(p), "Hello world");
//! assert_eq!(doc.to_html(), "<p>Hello world</p>");
//! ```

pub mod document;
pub mod node;
pub mod parser;
mod serialize;
mod sink;
pub mod traversal;

pub use document::{Document, DomError, byte_offset};
pub use node::{Attribute, ElementData, Node, NodeData, NodeId};
pub use parser::{parse_document, parse_html};
