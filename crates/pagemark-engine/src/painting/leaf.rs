//! Mapping a normalized offset back to a concrete text node.

use pagemark_dom::{Document, NodeId};

use crate::error::AnchorError;

/// Which text node wins when an offset falls on the boundary between two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    /// Prefer the start of the following node. Used for range starts.
    Forward,
    /// Prefer the end of the preceding node. Used for range ends.
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {
    /// A char offset inside a text node.
    Text { node: NodeId, offset: usize },
    /// The container has no text at all; nothing there can be painted.
    Empty(NodeId),
}

/// Find the text node and local offset at `absolute` chars into `container`.
///
/// This is the inverse of normalization. Empty text nodes are never chosen
/// while a non-empty one can hold the offset.
pub fn locate_leaf(
    doc: &Document,
    container: NodeId,
    absolute: usize,
    affinity: Affinity,
) -> Result<Leaf, AnchorError> {
    let texts: Vec<(NodeId, usize)> = if doc[container].is_text() {
        vec![(container, doc.text_len(container))]
    } else {
        doc.text_descendants(container)
            .map(|node| (node, doc.text_len(node)))
            .collect()
    };

    let total: usize = texts.iter().map(|(_, len)| len).sum();
    if absolute > total {
        return Err(AnchorError::AnchorNotFound(format!(
            "offset {absolute} is past the end of {container} ({total} chars)"
        )));
    }
    if total == 0 {
        return Ok(Leaf::Empty(container));
    }

    let mut start = 0;
    for &(node, len) in &texts {
        let hit = match affinity {
            Affinity::Forward => absolute < start + len,
            Affinity::Backward => len > 0 && absolute <= start + len,
        };
        if hit {
            return Ok(Leaf::Text {
                node,
                offset: absolute - start,
            });
        }
        start += len;
    }

    // Forward affinity at the very end: stick to the last non-empty node.
    let (node, len) = texts
        .iter()
        .rev()
        .find(|(_, len)| *len > 0)
        .copied()
        .ok_or(AnchorError::DetachedNode(container))?;
    Ok(Leaf::Text { node, offset: len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{element, text_node};
    use pagemark_dom::parse_html;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::inside_first(2, Affinity::Forward, "Hello ", 2)]
    #[case::boundary_forward(6, Affinity::Forward, "bold", 0)]
    #[case::boundary_backward(6, Affinity::Backward, "Hello ", 6)]
    #[case::nested_boundary_backward(10, Affinity::Backward, "bold", 4)]
    #[case::nested_boundary_forward(10, Affinity::Forward, " world", 0)]
    #[case::end_forward(16, Affinity::Forward, " world", 6)]
    #[case::start_backward(0, Affinity::Backward, "Hello ", 0)]
    fn locates_text_across_inline_elements(
        #[case] absolute: usize,
        #[case] affinity: Affinity,
        #[case] text: &str,
        #[case] offset: usize,
    ) {
        let doc = parse_html("<p>Hello <b>bold</b> world</p>");
        let p = element(&doc, "p", 0);

        let leaf = locate_leaf(&doc, p, absolute, affinity).unwrap();

        assert_eq!(
            leaf,
            Leaf::Text {
                node: text_node(&doc, text),
                offset
            }
        );
    }

    #[test]
    fn container_without_text_is_empty() {
        let doc = parse_html("<div><br><br></div>");
        let div = element(&doc, "div", 0);

        assert_eq!(
            locate_leaf(&doc, div, 0, Affinity::Forward).unwrap(),
            Leaf::Empty(div)
        );
    }

    #[test]
    fn offset_past_end_is_anchor_not_found() {
        let doc = parse_html("<p>abc</p>");
        let p = element(&doc, "p", 0);

        let err = locate_leaf(&doc, p, 4, Affinity::Backward).unwrap_err();
        assert!(matches!(err, AnchorError::AnchorNotFound(_)));
    }
}
