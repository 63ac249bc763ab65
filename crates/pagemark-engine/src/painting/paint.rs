//! Wrapping a resolved range in marker elements.

use std::cmp::Ordering;

use pagemark_dom::{Document, NodeId};

use crate::anchoring::ResolvedRange;
use crate::error::AnchorError;
use crate::marker::{HighlightId, MarkerStyle};
use crate::painting::leaf::{Affinity, Leaf, locate_leaf};

/// Outcome of painting one highlight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaintReport {
    /// Markers carrying the id after the call, in document order.
    pub markers: Vec<NodeId>,
    /// Fragments that could not be wrapped.
    pub skipped: Vec<AnchorError>,
    /// The id was already painted, so nothing changed.
    pub already_painted: bool,
}

impl PaintReport {
    pub fn is_painted(&self) -> bool {
        !self.markers.is_empty()
    }
}

/// One text node and the char range of it to wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fragment {
    node: NodeId,
    from: usize,
    to: usize,
}

/// Paint `range` with highlight `id`.
///
/// Painting an id that already has markers in the document is a no-op.
/// A fragment whose text node was detached along the way is skipped and
/// logged; the other fragments of the same highlight are still wrapped.
pub fn paint(
    doc: &mut Document,
    style: &MarkerStyle,
    range: &ResolvedRange,
    id: &HighlightId,
) -> Result<PaintReport, AnchorError> {
    let existing = style.markers_for(doc, id);
    if !existing.is_empty() {
        log::debug!("highlight {id} is already painted ({} markers)", existing.len());
        return Ok(PaintReport {
            markers: existing,
            already_painted: true,
            ..PaintReport::default()
        });
    }
    if range.is_collapsed(doc) {
        log::debug!("highlight {id} covers no text");
        return Ok(PaintReport::default());
    }

    let start = locate_leaf(doc, range.start.container, range.start.offset, Affinity::Forward)?;
    let end = locate_leaf(doc, range.end.container, range.end.offset, Affinity::Backward)?;
    let (
        Leaf::Text {
            node: start_node,
            offset: start_offset,
        },
        Leaf::Text {
            node: end_node,
            offset: end_offset,
        },
    ) = (start, end)
    else {
        log::debug!("highlight {id} lands in a container without text");
        return Ok(PaintReport::default());
    };

    // Everything is collected up front: wrapping reshapes the tree.
    let fragments = if start_node == end_node {
        vec![Fragment {
            node: start_node,
            from: start_offset,
            to: end_offset,
        }]
    } else if doc.compare_document_position(start_node, end_node) == Ordering::Less {
        let mut fragments = vec![Fragment {
            node: start_node,
            from: start_offset,
            to: doc.text_len(start_node),
        }];
        fragments.extend(
            interior_text_nodes(doc, start_node, end_node)
                .into_iter()
                .map(|node| Fragment {
                    node,
                    from: 0,
                    to: doc.text_len(node),
                }),
        );
        fragments.push(Fragment {
            node: end_node,
            from: 0,
            to: end_offset,
        });
        fragments
    } else {
        Vec::new()
    };

    let mut report = PaintReport::default();
    for fragment in fragments.into_iter().filter(|f| f.from < f.to) {
        match wrap(doc, style, fragment, id) {
            Ok(marker) => report.markers.push(marker),
            Err(err) => {
                log::warn!("skipping fragment of highlight {id}: {err}");
                report.skipped.push(err);
            }
        }
    }
    log::debug!(
        "painted highlight {id}: {} markers, {} skipped",
        report.markers.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Text nodes strictly between `start` and `end`, skipping whitespace-only ones.
fn interior_text_nodes(doc: &Document, start: NodeId, end: NodeId) -> Vec<NodeId> {
    let scope = doc.common_ancestor(start, end).unwrap_or(doc.root());
    doc.descendants(scope)
        .skip_while(|node| *node != start)
        .skip(1)
        .take_while(|node| *node != end)
        .filter(|node| doc[*node].is_text() && !doc[*node].is_whitespace_text())
        .filter(|node| doc.text_len(*node) > 0)
        .collect()
}

/// Wrap `[from, to)` of a text node in a new marker and return the marker.
fn wrap(
    doc: &mut Document,
    style: &MarkerStyle,
    fragment: Fragment,
    id: &HighlightId,
) -> Result<NodeId, AnchorError> {
    let Fragment { node, from, to } = fragment;
    let parent = doc.parent(node).ok_or(AnchorError::DetachedNode(node))?;
    if !doc.is_connected(node) {
        return Err(AnchorError::DetachedNode(node));
    }

    if to < doc.text_len(node) {
        doc.split_text(node, to)?;
    }
    let target = if from > 0 {
        doc.split_text(node, from)?
    } else {
        node
    };

    // Nested inside an older marker: carry its ids so hover still sees them.
    let mut ids = style.ids(doc, parent);
    ids.push(id.clone());
    let marker = doc.create_element(&style.tag_name, Vec::new());
    style.write_ids(doc, marker, &ids);
    doc.insert_before(target, marker)?;
    doc.append_child(marker, target)?;
    Ok(marker)
}
