//! Shared helpers for unit tests.

use pagemark_dom::{Document, NodeId};

/// The `nth` (0-based) element named `tag` in document order.
pub fn element(doc: &Document, tag: &str, nth: usize) -> NodeId {
    doc.descendants(doc.root())
        .filter(|id| doc[*id].tag_name() == Some(tag))
        .nth(nth)
        .unwrap_or_else(|| panic!("no <{tag}> number {nth} in {}", doc.to_html()))
}

/// The first text node whose data is exactly `text`.
pub fn text_node(doc: &Document, text: &str) -> NodeId {
    doc.descendants(doc.root())
        .find(|id| doc[*id].text() == Some(text))
        .unwrap_or_else(|| panic!("no text node {text:?} in {}", doc.to_html()))
}

/// Text data of every direct child, `None` for elements.
pub fn child_texts(doc: &Document, parent: NodeId) -> Vec<Option<String>> {
    doc.children(parent)
        .iter()
        .map(|child| doc[*child].text().map(str::to_string))
        .collect()
}
