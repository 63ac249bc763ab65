//! Node storage types.
//!
//! A [`Node`] lives in the [`Document`](crate::Document) arena and is
//! addressed by its [`NodeId`]. Detaching a node keeps it in the arena;
//! unwrapping, merging and [`Document::remove`] free it. Lookups through
//! [`Document::get`] and [`Document::is_connected`] are safe on stale ids.
//!
//! [`Document::remove`]: crate::Document::remove
//! [`Document::get`]: crate::Document::get
//! [`Document::is_connected`]: crate::Document::is_connected

use std::fmt;

/// Slot of a node in its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single `name="value"` pair on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Tag name and attributes of an element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercased tag name
    pub name: String,
    /// Attributes in source order
    pub attrs: Vec<Attribute>,
}

impl ElementData {
    pub fn new(name: &str, attrs: Vec<Attribute>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self
            .attrs
            .iter_mut()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
        {
            Some(attr) => {
                attr.value.clear();
                attr.value.push_str(value);
            }
            None => self.attrs.push(Attribute::new(name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<Attribute> {
        let index = self
            .attrs
            .iter()
            .position(|attr| attr.name.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(index))
    }
}

/// The payload of a node.
///
/// Comments, doctypes and processing instructions are dropped by the parser,
/// so every walk over the tree only has these three cases to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The root of a document. There is exactly one per [`Document`](crate::Document).
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

impl Node {
    pub(crate) fn new(id: NodeId, data: NodeData) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            data,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    pub fn is_document(&self) -> bool {
        matches!(self.data, NodeData::Document)
    }

    pub fn element_data(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn element_data_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut String> {
        match &mut self.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Lowercased tag name for elements.
    pub fn tag_name(&self) -> Option<&str> {
        self.element_data().map(|el| el.name.as_str())
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element_data().and_then(|el| el.attr(name))
    }

    /// Text node whose data is empty or consists only of whitespace.
    pub fn is_whitespace_text(&self) -> bool {
        self.text()
            .is_some_and(|text| text.chars().all(char::is_whitespace))
    }
}
