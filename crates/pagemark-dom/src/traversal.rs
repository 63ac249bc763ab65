//! Read-only tree walks.

use std::cmp::Ordering;

use crate::document::Document;
use crate::node::NodeId;

/// Pre-order iterator over the descendants of a node (the node itself excluded).
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Iterator from a node's parent up to the top of its tree.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.doc.parent(id);
        Some(id)
    }
}

impl Document {
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: self.children(id).iter().rev().copied().collect(),
        }
    }

    /// Text nodes under `id`, in document order.
    pub fn text_descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(id).filter(|desc| self[*desc].is_text())
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Whether `descendant` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        descendant == ancestor || self.ancestors(descendant).any(|id| id == ancestor)
    }

    /// Deepest node containing both `a` and `b`.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        std::iter::once(a)
            .chain(self.ancestors(a))
            .find(|candidate| self.contains(*candidate, b))
    }

    /// Child-index route from the top of the node's tree down to the node.
    fn index_route(&self, id: NodeId) -> Vec<usize> {
        let mut route: Vec<usize> = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|node| self.index_in_parent(node))
            .collect();
        route.reverse();
        route
    }

    /// Pre-order comparison of two nodes; an ancestor sorts before its descendants.
    pub fn compare_document_position(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        self.index_route(a).cmp(&self.index_route(b))
    }
}
