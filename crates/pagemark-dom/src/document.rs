//! The document arena and its mutation primitives.
//!
//! All mutation goes through `&mut Document`, which is the only shared
//! resource the highlight engine touches. Offsets passed to text operations
//! are counted in `char`s, never bytes.
//!
//! Nodes live in a [`Slab`]. Nodes dropped by [`Document::remove`],
//! [`Document::unwrap_element`] or [`Document::merge_text_run`] give their
//! slot back, so repeated paint and unpaint cycles do not grow the arena. A
//! freed id may be handed out again by a later `create_*` call.

use std::ops::Index;

use slab::Slab;
use thiserror::Error;

use crate::node::{Attribute, ElementData, Node, NodeData, NodeId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("node {0} is not a text node")]
    NotText(NodeId),

    #[error("node {0} is not an element")]
    NotElement(NodeId),

    #[error("node {0} has no parent")]
    NoParent(NodeId),

    #[error("offset {offset} is outside node {node} (length {len})")]
    OffsetOutOfRange {
        node: NodeId,
        offset: usize,
        len: usize,
    },

    #[error("cannot insert node {child} under {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
}

/// Arena-backed document tree.
///
/// `NodeId(0)` is always the [`NodeData::Document`] root.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Slab<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Panics on a freed id; use [`Document::get`] for ids that may be stale.
impl Index<NodeId> for Document {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self { nodes: Slab::new() };
        doc.create_node(NodeData::Document);
        doc
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The node behind `id`, or `None` once it has been freed.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Number of live nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn create_node(&mut self, data: NodeData) -> NodeId {
        let entry = self.nodes.vacant_entry();
        let id = NodeId(entry.key());
        entry.insert(Node::new(id, data));
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str, attrs: Vec<Attribute>) -> NodeId {
        self.create_node(NodeData::Element(ElementData::new(name, attrs)))
    }

    /// Create a detached text node.
    pub fn create_text_node(&mut self, text: &str) -> NodeId {
        self.create_node(NodeData::Text(text.to_string()))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// Children of `id`; empty for a freed node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |node| node.children.as_slice())
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|prev| self.children(parent).get(prev).copied())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Whether the node is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        let mut current = id;
        loop {
            if current == self.root() {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.attr(name)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let element = self
            .nodes
            .get_mut(id.0)
            .and_then(Node::element_data_mut)
            .ok_or(DomError::NotElement(id))?;
        element.set_attr(name, value);
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<Attribute> {
        self.nodes
            .get_mut(id.0)?
            .element_data_mut()?
            .remove_attr(name)
    }

    /// Replace the data of a text node.
    pub fn set_text(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        let text = self.node_mut(id).text_mut().ok_or(DomError::NotText(id))?;
        text.clear();
        text.push_str(value);
        Ok(())
    }

    /// Concatenated data of all text nodes under (and including) `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self[id].text() {
            out.push_str(text);
        }
        for desc in self.descendants(id) {
            if let Some(text) = self[desc].text() {
                out.push_str(text);
            }
        }
        out
    }

    /// Length of [`text_content`](Self::text_content) in chars.
    pub fn text_len(&self, id: NodeId) -> usize {
        match &self[id].data {
            NodeData::Text(text) => text.chars().count(),
            NodeData::Document | NodeData::Element(_) => self
                .descendants(id)
                .filter_map(|desc| self[desc].text())
                .map(|text| text.chars().count())
                .sum(),
        }
    }

    /// Remove `id` from its parent. The node and its subtree stay in the arena.
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.0) else {
            return;
        };
        if let Some(parent) = node.parent.take() {
            self.node_mut(parent).children.retain(|child| *child != id);
        }
    }

    /// Detach `id` and free it together with its subtree.
    ///
    /// The root is never freed. Returns `false` if `id` was already gone.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root() || self.get(id).is_none() {
            return false;
        }
        self.detach(id);
        self.free_subtree(id);
        true
    }

    fn free_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.try_remove(id.0) {
            for child in node.children {
                self.free_subtree(child);
            }
        }
    }

    /// Append `text` to the data of text node `id`.
    pub fn push_text(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        let data = self
            .nodes
            .get_mut(id.0)
            .and_then(Node::text_mut)
            .ok_or(DomError::NotText(id))?;
        data.push_str(text);
        Ok(())
    }

    /// Append `text` to the last child of `parent` if that is a text node,
    /// otherwise append a new text node.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<(), DomError> {
        if let Some(&last) = self.children(parent).last()
            && self.push_text(last, text).is_ok()
        {
            return Ok(());
        }
        let node = self.create_text_node(text);
        self.append_child(parent, node)
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        // No cycles, no second root, no freed nodes, and text nodes cannot have children.
        let (Some(parent_node), Some(_)) = (self.get(parent), self.get(child)) else {
            return Err(DomError::HierarchyRequest { parent, child });
        };
        if child == self.root() || self.contains(child, parent) || parent_node.is_text() {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Insert `new_node` immediately before `anchor` under the anchor's parent.
    pub fn insert_before(&mut self, anchor: NodeId, new_node: NodeId) -> Result<(), DomError> {
        let parent = self.parent(anchor).ok_or(DomError::NoParent(anchor))?;
        self.check_insert(parent, new_node)?;
        self.detach(new_node);
        let index = self
            .index_in_parent(anchor)
            .ok_or(DomError::NoParent(anchor))?;
        self.node_mut(parent).children.insert(index, new_node);
        self.node_mut(new_node).parent = Some(parent);
        Ok(())
    }

    /// Insert `new_node` immediately after `anchor` under the anchor's parent.
    pub fn insert_after(&mut self, anchor: NodeId, new_node: NodeId) -> Result<(), DomError> {
        match self.next_sibling(anchor) {
            Some(next) => self.insert_before(next, new_node),
            None => {
                let parent = self.parent(anchor).ok_or(DomError::NoParent(anchor))?;
                self.append_child(parent, new_node)
            }
        }
    }

    /// Split a text node at a char offset, like DOM `Text.splitText`.
    ///
    /// The node keeps `[0, offset)`; a new text node holding the rest is
    /// returned and, if the node is parented, inserted right after it.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let text = self
            .get(id)
            .and_then(Node::text)
            .ok_or(DomError::NotText(id))?;
        let len = text.chars().count();
        if offset > len {
            return Err(DomError::OffsetOutOfRange {
                node: id,
                offset,
                len,
            });
        }
        let split_at = byte_offset(text, offset);
        let tail = text[split_at..].to_string();
        if let Some(text) = self.node_mut(id).text_mut() {
            text.truncate(split_at);
        }
        let new_node = self.create_text_node(&tail);
        if self.parent(id).is_some() {
            self.insert_after(id, new_node)?;
        }
        Ok(new_node)
    }

    /// Move every child of `id` to its position and free `id`.
    ///
    /// Returns the moved children in order.
    pub fn unwrap_element(&mut self, id: NodeId) -> Result<Vec<NodeId>, DomError> {
        if !self.get(id).is_some_and(Node::is_element) {
            return Err(DomError::NotElement(id));
        }
        if self.parent(id).is_none() {
            return Err(DomError::NoParent(id));
        }
        let children = self.children(id).to_vec();
        for child in &children {
            self.insert_before(id, *child)?;
        }
        self.remove(id);
        Ok(children)
    }

    /// Merge runs of adjacent text siblings among `parent.children[from..=to]`
    /// into the first node of each run. Merged-away nodes are freed.
    pub fn merge_text_run(&mut self, parent: NodeId, from: usize, to: usize) {
        let mut index = from;
        let mut to = to;
        while index < to && index + 1 < self.children(parent).len() {
            let current = self.children(parent)[index];
            let next = self.children(parent)[index + 1];
            let next_text = match (self[current].is_text(), self[next].text()) {
                (true, Some(text)) => text.to_string(),
                _ => {
                    index += 1;
                    continue;
                }
            };
            if let Some(text) = self.node_mut(current).text_mut() {
                text.push_str(&next_text);
            }
            self.remove(next);
            to -= 1;
        }
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        crate::serialize::inner_html(self, self.root())
    }

    /// Serialize a node including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        crate::serialize::outer_html(self, id)
    }

    /// Serialize the children of a node.
    pub fn inner_html(&self, id: NodeId) -> String {
        crate::serialize::inner_html(self, id)
    }
}

/// Byte index of the `offset`-th char of `text`, or `text.len()` past the end.
pub fn byte_offset(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_html;
    use pretty_assertions::assert_eq;

    #[test]
    fn split_text_keeps_head_and_inserts_tail() {
        let mut doc = parse_html("<p>Hello world</p>");
        let p = doc.children(doc.root())[0];
        let text = doc.children(p)[0];

        let tail = doc.split_text(text, 6).unwrap();

        assert_eq!(doc[text].text(), Some("Hello "));
        assert_eq!(doc[tail].text(), Some("world"));
        assert_eq!(doc.children(p), &[text, tail]);
    }

    #[test]
    fn split_text_counts_chars_not_bytes() {
        let mut doc = parse_html("<p>héllo</p>");
        let p = doc.children(doc.root())[0];
        let text = doc.children(p)[0];

        let tail = doc.split_text(text, 2).unwrap();

        assert_eq!(doc[text].text(), Some("hé"));
        assert_eq!(doc[tail].text(), Some("llo"));
    }

    #[test]
    fn split_text_rejects_offset_past_end() {
        let mut doc = parse_html("<p>abc</p>");
        let p = doc.children(doc.root())[0];
        let text = doc.children(p)[0];

        let err = doc.split_text(text, 4).unwrap_err();
        assert_eq!(
            err,
            DomError::OffsetOutOfRange {
                node: text,
                offset: 4,
                len: 3
            }
        );
    }

    #[test]
    fn unwrap_element_moves_children_into_place() {
        let mut doc = parse_html("<p>a<b>bc</b>d</p>");
        let p = doc.children(doc.root())[0];
        let b = doc.children(p)[1];

        let moved = doc.unwrap_element(b).unwrap();

        assert_eq!(moved.len(), 1);
        assert!(!doc.is_connected(b));
        assert_eq!(doc.inner_html(p), "abcd");
        assert_eq!(doc.children(p).len(), 3);
    }

    #[test]
    fn merge_text_run_joins_adjacent_text() {
        let mut doc = parse_html("<p>a<b>bc</b>d</p>");
        let p = doc.children(doc.root())[0];
        let b = doc.children(p)[1];
        doc.unwrap_element(b).unwrap();

        doc.merge_text_run(p, 0, 2);

        assert_eq!(doc.children(p).len(), 1);
        assert_eq!(doc.text_content(p), "abcd");
    }

    #[test]
    fn merge_text_run_stops_at_elements() {
        let mut doc = parse_html("<p>a<i>x</i>b</p>");
        let p = doc.children(doc.root())[0];
        let tail = doc.children(p)[2];
        let extra = doc.create_text_node("c");
        doc.append_child(p, extra).unwrap();

        doc.merge_text_run(p, 0, 3);

        assert_eq!(doc.children(p).len(), 3);
        assert_eq!(doc[tail].text(), Some("bc"));
    }

    #[test]
    fn split_and_merge_cycles_reuse_slots() {
        let mut doc = parse_html("<p>Hello world</p>");
        let p = doc.children(doc.root())[0];
        let text = doc.children(p)[0];
        let baseline = doc.node_count();

        for _ in 0..100 {
            let tail = doc.split_text(text, 6).unwrap();
            let marker = doc.create_element("mark", Vec::new());
            doc.insert_before(tail, marker).unwrap();
            doc.append_child(marker, tail).unwrap();

            doc.unwrap_element(marker).unwrap();
            doc.merge_text_run(p, 0, 1);
        }

        assert_eq!(doc.node_count(), baseline);
        assert_eq!(doc.to_html(), "<p>Hello world</p>");
    }

    #[test]
    fn remove_frees_the_whole_subtree() {
        let mut doc = parse_html("<div><p>a<b>b</b></p></div>");
        let div = doc.children(doc.root())[0];
        let p = doc.children(div)[0];

        assert!(doc.remove(p));

        assert_eq!(doc.node_count(), 2);
        assert!(doc.get(p).is_none());
        assert!(doc.children(p).is_empty());
        assert_eq!(doc.parent(p), None);
        assert!(!doc.is_connected(p));
        assert!(!doc.remove(p));
        assert!(!doc.remove(doc.root()));
    }

    #[test]
    fn freed_ids_are_rejected_by_mutations() {
        let mut doc = parse_html("<p>x</p>");
        let p = doc.children(doc.root())[0];
        let text = doc.children(p)[0];
        doc.remove(text);

        assert_eq!(doc.split_text(text, 0), Err(DomError::NotText(text)));
        assert_eq!(doc.set_attr(text, "a", "b"), Err(DomError::NotElement(text)));
        assert_eq!(doc.remove_attr(text, "a"), None);
        assert_eq!(
            doc.append_child(p, text),
            Err(DomError::HierarchyRequest { parent: p, child: text })
        );
    }

    #[test]
    fn append_text_extends_trailing_text() {
        let mut doc = parse_html("<p>a<b>b</b></p>");
        let p = doc.children(doc.root())[0];

        doc.append_text(p, "c").unwrap();
        doc.append_text(p, "d").unwrap();

        assert_eq!(doc.children(p).len(), 3);
        assert_eq!(doc.inner_html(p), "a<b>b</b>cd");
    }

    #[test]
    fn append_child_refuses_cycles() {
        let mut doc = parse_html("<div><p>x</p></div>");
        let div = doc.children(doc.root())[0];
        let p = doc.children(div)[0];

        let err = doc.append_child(p, div).unwrap_err();
        assert_eq!(err, DomError::HierarchyRequest { parent: p, child: div });
    }

    #[test]
    fn detached_nodes_report_not_connected() {
        let mut doc = parse_html("<p>x</p>");
        let p = doc.children(doc.root())[0];
        let text = doc.children(p)[0];

        doc.detach(p);

        assert!(!doc.is_connected(p));
        assert!(!doc.is_connected(text));
        assert!(doc.is_connected(doc.root()));
    }
}
