//! Removing a highlight's markers again.

use pagemark_dom::Document;

use crate::marker::{HighlightId, MarkerStyle};

/// Outcome of unpainting one highlight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnpaintReport {
    /// Markers that lost their last id and were removed.
    pub unwrapped: usize,
    /// Markers kept because other highlights still cover them.
    pub retained: usize,
}

impl UnpaintReport {
    pub fn touched(&self) -> usize {
        self.unwrapped + self.retained
    }
}

/// Remove highlight `id` from the document.
///
/// A marker still carrying other ids keeps its element with a shorter list.
/// A marker left without ids is unwrapped and the text around it merged, so
/// painting then unpainting restores the original text node layout.
pub fn unpaint(doc: &mut Document, style: &MarkerStyle, id: &HighlightId) -> UnpaintReport {
    let mut report = UnpaintReport::default();

    for marker in style.markers_for(doc, id) {
        let mut ids = style.ids(doc, marker);
        ids.remove(id);
        if !ids.is_empty() {
            style.write_ids(doc, marker, &ids);
            report.retained += 1;
            continue;
        }

        let (Some(parent), Some(index)) = (doc.parent(marker), doc.index_in_parent(marker)) else {
            log::warn!("marker {marker} for highlight {id} is detached");
            continue;
        };
        match doc.unwrap_element(marker) {
            Ok(moved) => {
                // previous sibling, moved children, next sibling
                doc.merge_text_run(parent, index.saturating_sub(1), index + moved.len());
                report.unwrapped += 1;
            }
            Err(err) => log::warn!("could not unwrap marker {marker} for highlight {id}: {err}"),
        }
    }

    log::debug!(
        "unpainted highlight {id}: {} unwrapped, {} retained",
        report.unwrapped,
        report.retained
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchoring::{NormalizedPoint, ResolvedRange};
    use crate::tests::{child_texts, element};
    use pagemark_dom::parse_html;
    use pretty_assertions::assert_eq;

    #[test]
    fn unwraps_and_merges_text() {
        let mut doc = parse_html(
            r#"<p>Hello <mark data-highlight-ids="h1" data-highlight-id="h1">world</mark>!</p>"#,
        );
        let style = MarkerStyle::default();
        let p = element(&doc, "p", 0);

        let report = unpaint(&mut doc, &style, &"h1".into());

        assert_eq!(report, UnpaintReport { unwrapped: 1, retained: 0 });
        assert_eq!(child_texts(&doc, p), vec![Some("Hello world!".to_string())]);
    }

    #[test]
    fn shared_marker_keeps_remaining_ids() {
        let mut doc = parse_html(concat!(
            r#"<p><mark data-highlight-ids="a" data-highlight-id="a">Hello "#,
            r#"<mark data-highlight-ids="a;b" data-highlight-id="b">world</mark></mark></p>"#
        ));
        let style = MarkerStyle::default();

        let report = unpaint(&mut doc, &style, &"a".into());

        assert_eq!(report, UnpaintReport { unwrapped: 1, retained: 1 });
        insta::assert_snapshot!(doc.to_html(), @r#"<p>Hello <mark data-highlight-ids="b" data-highlight-id="b">world</mark></p>"#);
    }

    #[test]
    fn repeated_paint_and_unpaint_reuses_nodes() {
        let mut doc = parse_html("<p>Hello world, again</p>");
        let style = MarkerStyle::default();
        let p = element(&doc, "p", 0);
        let baseline = doc.node_count();
        let range = ResolvedRange {
            start: NormalizedPoint { container: p, offset: 6 },
            end: NormalizedPoint { container: p, offset: 11 },
        };

        for _ in 0..1000 {
            crate::painting::paint(&mut doc, &style, &range, &"h1".into()).unwrap();
            unpaint(&mut doc, &style, &"h1".into());
        }

        assert_eq!(doc.node_count(), baseline);
        assert_eq!(doc.to_html(), "<p>Hello world, again</p>");
    }

    #[test]
    fn unknown_id_changes_nothing() {
        let html = r#"<p>x<mark data-highlight-ids="a" data-highlight-id="a">y</mark></p>"#;
        let mut doc = parse_html(html);

        let report = unpaint(&mut doc, &MarkerStyle::default(), &"zzz".into());

        assert_eq!(report.touched(), 0);
        assert_eq!(doc.to_html(), html);
    }

    #[test]
    fn marker_between_elements_leaves_them_alone() {
        let mut doc = parse_html(
            r#"<p><b>x</b><mark data-highlight-ids="a" data-highlight-id="a">y</mark><i>z</i></p>"#,
        );

        unpaint(&mut doc, &MarkerStyle::default(), &"a".into());

        assert_eq!(doc.to_html(), "<p><b>x</b>y<i>z</i></p>");
    }
}
