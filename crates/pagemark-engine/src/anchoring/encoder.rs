//! Selection capture: live endpoints to a [`PositionDescriptor`].

use std::cmp::Ordering;

use pagemark_dom::{Document, NodeId};

use crate::anchoring::descriptor::PositionDescriptor;
use crate::anchoring::normalize::{
    NormalizedPoint, Point, compare_normalized, text_before, to_stable_container,
};
use crate::anchoring::path::compute_path;
use crate::error::{AnchorError, SelectionProblem};
use crate::marker::MarkerStyle;

/// Two raw selection endpoints in the order the user produced them.
///
/// `anchor` is where the selection started and `focus` where it ended, so a
/// backwards drag has the focus before the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }
}

/// Normalize both endpoints and return them start-first.
///
/// Fails if either endpoint cannot be normalized, or if the selection covers
/// no text. That includes a selection from the end of one block to the start
/// of the next, whose endpoints differ but enclose nothing.
pub fn ordered_endpoints(
    doc: &Document,
    style: &MarkerStyle,
    selection: &Selection,
) -> Result<(NormalizedPoint, NormalizedPoint), AnchorError> {
    let anchor = to_stable_container(doc, style, selection.anchor)
        .map_err(|err| AnchorError::InvalidSelection(err.into()))?;
    let focus = to_stable_container(doc, style, selection.focus)
        .map_err(|err| AnchorError::InvalidSelection(err.into()))?;

    let (start, end) = match compare_normalized(doc, anchor, focus) {
        Ordering::Less => (anchor, focus),
        Ordering::Greater => (focus, anchor),
        Ordering::Equal => {
            return Err(AnchorError::InvalidSelection(SelectionProblem::Collapsed));
        }
    };
    if scoped_offsets(doc, start, end).is_empty() {
        return Err(AnchorError::InvalidSelection(SelectionProblem::Collapsed));
    }
    Ok((start, end))
}

/// Encode a selection as a position descriptor for `base_url`.
pub fn encode(
    doc: &Document,
    style: &MarkerStyle,
    selection: &Selection,
    base_url: &str,
) -> Result<PositionDescriptor, AnchorError> {
    let (start, end) = ordered_endpoints(doc, style, selection)?;
    Ok(PositionDescriptor {
        base_url: base_url.to_string(),
        start_path: compute_path(doc, style, start.container),
        start_offset: start.offset,
        end_path: compute_path(doc, style, end.container),
        end_offset: end.offset,
    })
}

/// The text a selection covers, as it reads in the document.
pub fn selected_text(
    doc: &Document,
    style: &MarkerStyle,
    selection: &Selection,
) -> Result<String, AnchorError> {
    let (start, end) = ordered_endpoints(doc, style, selection)?;
    Ok(text_between(doc, start, end))
}

/// Both points as char offsets into the text of the smallest container
/// holding them, together with that container.
struct Scoped {
    scope: NodeId,
    from: usize,
    to: usize,
}

impl Scoped {
    fn is_empty(&self) -> bool {
        self.to <= self.from
    }
}

fn scoped_offsets(doc: &Document, start: NormalizedPoint, end: NormalizedPoint) -> Scoped {
    let scope = doc
        .common_ancestor(start.container, end.container)
        .unwrap_or(doc.root());
    let to_scope = |point: NormalizedPoint| {
        if point.container == scope {
            point.offset
        } else {
            text_before(doc, scope, point.container) + point.offset
        }
    };
    Scoped {
        scope,
        from: to_scope(start),
        to: to_scope(end),
    }
}

/// Text between two ordered normalized points.
pub(crate) fn text_between(doc: &Document, start: NormalizedPoint, end: NormalizedPoint) -> String {
    let Scoped { scope, from, to } = scoped_offsets(doc, start, end);
    doc.text_content(scope)
        .chars()
        .skip(from)
        .take(to.saturating_sub(from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{element, text_node};
    use pagemark_dom::parse_html;
    use pretty_assertions::assert_eq;

    #[test]
    fn hello_world_descriptor() {
        let doc = parse_html("<p>Hello world</p>");
        let style = MarkerStyle::default();
        let text = text_node(&doc, "Hello world");
        let selection = Selection::new(Point::new(text, 6), Point::new(text, 11));

        let descriptor = encode(&doc, &style, &selection, "https://example.com/a").unwrap();

        assert_eq!(
            descriptor.to_string(),
            "https://example.com/a?xpath=(startnode=/p[1],startoffset=6,endnode=/p[1],endoffset=11)"
        );
        assert_eq!(selected_text(&doc, &style, &selection).unwrap(), "world");
    }

    #[test]
    fn reversed_selection_encodes_like_forward() {
        let doc = parse_html("<div><p>one two</p><p>three <i>four</i></p></div>");
        let style = MarkerStyle::default();
        let one_two = text_node(&doc, "one two");
        let four = text_node(&doc, "four");
        let forward = Selection::new(Point::new(one_two, 4), Point::new(four, 2));
        let backward = Selection::new(Point::new(four, 2), Point::new(one_two, 4));

        let a = encode(&doc, &style, &forward, "u").unwrap();
        let b = encode(&doc, &style, &backward, "u").unwrap();

        assert_eq!(a, b);
        assert_eq!(a.start_path.to_string(), "/div[1]/p[1]");
        assert_eq!(a.end_path.to_string(), "/div[1]/p[2]/i[1]");
        assert_eq!(selected_text(&doc, &style, &backward).unwrap(), "twothree fo");
    }

    #[test]
    fn collapsed_selection_is_invalid() {
        let doc = parse_html("<p>Hello <b>bold</b></p>");
        let style = MarkerStyle::default();
        let hello = text_node(&doc, "Hello ");
        let b = element(&doc, "b", 0);
        // Same spot in the document, reached through two different nodes.
        let selection = Selection::new(Point::new(hello, 6), Point::new(b, 0));

        let err = encode(&doc, &style, &selection, "u").unwrap_err();
        assert_eq!(err, AnchorError::InvalidSelection(SelectionProblem::Collapsed));
    }

    #[test]
    fn selection_spanning_only_a_block_boundary_is_invalid() {
        let doc = parse_html("<p>a</p><p>b</p>");
        let style = MarkerStyle::default();
        let a = text_node(&doc, "a");
        let b = text_node(&doc, "b");
        let selection = Selection::new(Point::new(a, 1), Point::new(b, 0));

        let err = encode(&doc, &style, &selection, "u").unwrap_err();
        assert_eq!(err, AnchorError::InvalidSelection(SelectionProblem::Collapsed));
        assert!(selected_text(&doc, &style, &selection).is_err());

        let one_char = Selection::new(Point::new(a, 0), Point::new(b, 0));
        assert_eq!(selected_text(&doc, &style, &one_char).unwrap(), "a");
    }

    #[test]
    fn detached_endpoint_is_invalid() {
        let mut doc = parse_html("<p>a</p><p>b</p>");
        let style = MarkerStyle::default();
        let a = text_node(&doc, "a");
        let b = text_node(&doc, "b");
        let second = element(&doc, "p", 1);
        doc.detach(second);

        let err = encode(&doc, &style, &Selection::new(Point::new(a, 0), Point::new(b, 1)), "u")
            .unwrap_err();
        assert!(matches!(err, AnchorError::InvalidSelection(SelectionProblem::Unanchorable(_))));
    }
}
