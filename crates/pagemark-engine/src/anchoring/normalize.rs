//! Offset normalization.
//!
//! A raw point may sit inside a text node or inside a marker left by an
//! earlier paint. Neither is safe to anchor to: text nodes are split and
//! merged by painting, and markers come and go. Normalizing climbs to the
//! nearest *stable container* (neither text nor marker) and re-expresses the
//! offset as a char count into that container's text content.

use std::cmp::Ordering;

use pagemark_dom::{Document, NodeId};
use thiserror::Error;

use crate::marker::MarkerStyle;

/// A position in the document.
///
/// `offset` counts chars: into the data of a text node, or into the
/// concatenated text content of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub node: NodeId,
    pub offset: usize,
}

impl Point {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A [`Point`] expressed against a stable container.
///
/// Invariant: `offset <= text_len(container)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedPoint {
    pub container: NodeId,
    pub offset: usize,
}

impl From<NormalizedPoint> for Point {
    fn from(point: NormalizedPoint) -> Self {
        Point::new(point.container, point.offset)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("node {0} is not attached to the document")]
    Detached(NodeId),

    #[error("offset {offset} is past the end of node {node} (length {len})")]
    OffsetOutOfRange {
        node: NodeId,
        offset: usize,
        len: usize,
    },
}

pub fn is_stable_container(doc: &Document, style: &MarkerStyle, node: NodeId) -> bool {
    !doc[node].is_text() && !style.is_marker(doc, node)
}

/// Chars of text inside `container` that precede `node` in document order.
pub(crate) fn text_before(doc: &Document, container: NodeId, node: NodeId) -> usize {
    doc.descendants(container)
        .take_while(|desc| *desc != node)
        .filter_map(|desc| doc[desc].text())
        .map(|text| text.chars().count())
        .sum()
}

/// Move `point` to its nearest stable container.
///
/// Normalizing an already normalized point returns it unchanged.
pub fn to_stable_container(
    doc: &Document,
    style: &MarkerStyle,
    point: Point,
) -> Result<NormalizedPoint, NormalizeError> {
    if !doc.is_connected(point.node) {
        return Err(NormalizeError::Detached(point.node));
    }
    let len = doc.text_len(point.node);
    if point.offset > len {
        return Err(NormalizeError::OffsetOutOfRange {
            node: point.node,
            offset: point.offset,
            len,
        });
    }

    let mut container = point.node;
    while !is_stable_container(doc, style, container) {
        // The root is always a stable container, so a connected node always
        // finds one before running out of parents.
        container = doc
            .parent(container)
            .ok_or(NormalizeError::Detached(point.node))?;
    }

    let offset = if container == point.node {
        point.offset
    } else {
        text_before(doc, container, point.node) + point.offset
    };
    Ok(NormalizedPoint { container, offset })
}

/// Order two normalized points.
///
/// Points in the same container, or where one container holds the other,
/// compare by text offset. Otherwise the containers' document order decides.
pub fn compare_normalized(doc: &Document, a: NormalizedPoint, b: NormalizedPoint) -> Ordering {
    if a.container == b.container {
        a.offset.cmp(&b.offset)
    } else if doc.contains(a.container, b.container) {
        let b_offset = text_before(doc, a.container, b.container) + b.offset;
        a.offset.cmp(&b_offset)
    } else if doc.contains(b.container, a.container) {
        let a_offset = text_before(doc, b.container, a.container) + a.offset;
        a_offset.cmp(&b.offset)
    } else {
        doc.compare_document_position(a.container, b.container)
    }
}

/// Normalize and order two raw points.
pub fn compare(
    doc: &Document,
    style: &MarkerStyle,
    a: Point,
    b: Point,
) -> Result<Ordering, NormalizeError> {
    let a = to_stable_container(doc, style, a)?;
    let b = to_stable_container(doc, style, b)?;
    Ok(compare_normalized(doc, a, b))
}
