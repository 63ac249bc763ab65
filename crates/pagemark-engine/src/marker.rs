//! Marker elements and their highlight id lists.
//!
//! A marker is an inline element wrapping one contiguous text run. It carries
//! two attributes:
//!
//! - the id list (`data-highlight-ids` by default): every highlight covering
//!   the run, semicolon-joined in paint order, so the last id is the topmost
//! - the primary id (`data-highlight-id`): the newest id alone
//!
//! The list is only a wire format. Code in this crate reads it into a
//! [`MarkerIds`] set, edits the set, and writes it back.

use std::fmt;

use pagemark_dom::{Document, NodeId};
use serde::{Deserialize, Serialize};

/// Identifier of a saved highlight, as issued by the highlight store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighlightId(pub String);

impl HighlightId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HighlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HighlightId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Ordered, duplicate-free list of the highlights covering one marker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkerIds(Vec<HighlightId>);

impl MarkerIds {
    pub const SEPARATOR: char = ';';

    /// Parse an id-list attribute value. Empty segments are ignored and
    /// repeated ids keep their first position.
    pub fn parse(value: &str) -> Self {
        let mut ids = Self::default();
        for part in value.split(Self::SEPARATOR) {
            let part = part.trim();
            if !part.is_empty() {
                ids.push(HighlightId::from(part));
            }
        }
        ids
    }

    /// Append `id` as the topmost highlight. No-op if it is already present.
    pub fn push(&mut self, id: HighlightId) {
        if !self.contains(&id) {
            self.0.push(id);
        }
    }

    /// Remove `id`, returning whether it was present.
    pub fn remove(&mut self, id: &HighlightId) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != id);
        self.0.len() != before
    }

    pub fn contains(&self, id: &HighlightId) -> bool {
        self.0.iter().any(|existing| existing == id)
    }

    /// The most recently painted highlight.
    pub fn topmost(&self) -> Option<&HighlightId> {
        self.0.last()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HighlightId> {
        self.0.iter()
    }
}

impl fmt::Display for MarkerIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", Self::SEPARATOR)?;
            }
            f.write_str(id.as_str())?;
        }
        Ok(())
    }
}

/// Names used for marker elements and their attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerStyle {
    pub tag_name: String,
    pub ids_attribute: String,
    pub primary_attribute: String,
    /// Set to `"true"` on every fragment of the hovered highlight.
    pub active_attribute: String,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            tag_name: "mark".to_string(),
            ids_attribute: "data-highlight-ids".to_string(),
            primary_attribute: "data-highlight-id".to_string(),
            active_attribute: "data-highlight-active".to_string(),
        }
    }
}

impl MarkerStyle {
    /// An element with the marker tag and an id-list attribute.
    ///
    /// Page content that merely uses the same tag is not a marker.
    pub fn is_marker(&self, doc: &Document, node: NodeId) -> bool {
        doc.get(node)
            .and_then(|node| node.element_data())
            .is_some_and(|el| el.name == self.tag_name && el.has_attr(&self.ids_attribute))
    }

    /// Ids carried by `node`; empty for non-markers.
    pub fn ids(&self, doc: &Document, node: NodeId) -> MarkerIds {
        if !self.is_marker(doc, node) {
            return MarkerIds::default();
        }
        doc.attr(node, &self.ids_attribute)
            .map(MarkerIds::parse)
            .unwrap_or_default()
    }

    /// Write `ids` back to `node`, keeping the primary attribute on the topmost id.
    pub(crate) fn write_ids(&self, doc: &mut Document, node: NodeId, ids: &MarkerIds) {
        let list = ids.to_string();
        let primary = ids.topmost().map(|id| id.to_string()).unwrap_or_default();
        // Callers only pass element ids, for which these cannot fail.
        let _ = doc.set_attr(node, &self.ids_attribute, &list);
        let _ = doc.set_attr(node, &self.primary_attribute, &primary);
    }

    /// Nearest marker at or above `node`.
    pub fn marker_for(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        std::iter::once(node)
            .chain(doc.ancestors(node))
            .find(|candidate| self.is_marker(doc, *candidate))
    }

    /// Every marker carrying `id`, in document order.
    pub fn markers_for(&self, doc: &Document, id: &HighlightId) -> Vec<NodeId> {
        doc.descendants(doc.root())
            .filter(|node| self.ids(doc, *node).contains(id))
            .collect()
    }

    /// Distinct ids painted anywhere in the document, in first-seen order.
    pub fn painted_ids(&self, doc: &Document) -> Vec<HighlightId> {
        let mut seen = MarkerIds::default();
        for node in doc.descendants(doc.root()) {
            for id in self.ids(doc, node).iter() {
                seen.push(id.clone());
            }
        }
        seen.0
    }
}
