//! HTML parsing into a [`Document`].
//!
//! Tree building is delegated to html5ever, so implied `html`/`head`/`body`
//! elements, implicit end tags and misnested formatting elements come out the
//! way a browser builds them. That matters for structural paths: a path
//! computed here has to agree with one computed on the live page.

use html5ever::ParseOpts;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;

use crate::document::{Document, DomError};
use crate::node::NodeId;
use crate::sink::DocumentSink;

/// Elements that never have children.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text children are serialized without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "noscript", "plaintext",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

/// Parse a complete page. The root holds the `html` element.
pub fn parse_document(input: &str) -> Document {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    };
    html5ever::parse_document(DocumentSink::new(), opts).one(input)
}

/// Parse markup as page content.
///
/// The input is parsed like a full page, then the contents of `head` and
/// `body` are moved up to the root and the implied wrappers dropped, so
/// `"<p>x</p>"` gives a root with a single `p` child. Never fails.
pub fn parse_html(input: &str) -> Document {
    let mut doc = parse_document(input);
    if let Err(err) = hoist_body(&mut doc) {
        log::debug!("could not flatten parsed fragment: {err}");
    }
    doc
}

fn hoist_body(doc: &mut Document) -> Result<(), DomError> {
    let root = doc.root();
    let wrappers: Vec<NodeId> = doc
        .children(root)
        .iter()
        .copied()
        .filter(|id| doc[*id].tag_name() == Some("html"))
        .collect();
    for html in wrappers {
        for section in doc.children(html).to_vec() {
            for child in doc.children(section).to_vec() {
                doc.append_child(root, child)?;
            }
        }
        doc.remove(html);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn builds_nested_elements() {
        let doc = parse_html("<div><p>Hello <b>bold</b> world</p></div>");
        let div = doc.children(doc.root())[0];
        let p = doc.children(div)[0];

        assert_eq!(doc[div].tag_name(), Some("div"));
        assert_eq!(doc.children(p).len(), 3);
        assert_eq!(doc.text_content(p), "Hello bold world");
    }

    #[test]
    fn full_document_keeps_implied_wrappers() {
        let doc = parse_document("<body><p>one<p>two</body>");
        let html = doc.children(doc.root())[0];
        let tags: Vec<_> = doc
            .children(html)
            .iter()
            .map(|id| doc[*id].tag_name())
            .collect();
        assert_eq!(tags, vec![Some("head"), Some("body")]);

        let body = doc.children(html)[1];
        assert_eq!(doc.inner_html(body), "<p>one</p><p>two</p>");
    }

    #[rstest]
    #[case("<p>one<p>two", "<p>one</p><p>two</p>")]
    #[case("<ul><li>a<li>b</ul>", "<ul><li>a</li><li>b</li></ul>")]
    #[case("<table><tr><td>x</table>", "<table><tbody><tr><td>x</td></tr></tbody></table>")]
    #[case("<div><p>a<i>b</div>c", "<div><p>a<i>b</i></p></div><i>c</i>")]
    fn implied_tags_match_browser_parsing(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(parse_html(source).to_html(), expected);
    }

    #[test]
    fn misnested_formatting_is_repaired() {
        let doc = parse_html("<p><b>bold<i>both</b>italic</i></p>");
        assert_eq!(
            doc.to_html(),
            "<p><b>bold<i>both</i></b><i>italic</i></p>"
        );
    }

    #[test]
    fn void_elements_do_not_nest() {
        let doc = parse_html("<p>a<br>b</p>");
        let p = doc.children(doc.root())[0];
        assert_eq!(doc.children(p).len(), 3);
    }

    #[test]
    fn comments_are_dropped_and_text_rejoined() {
        let doc = parse_html("<p>a<!-- gone -->b</p>");
        let p = doc.children(doc.root())[0];
        assert_eq!(doc.children(p).len(), 1);
        assert_eq!(doc.text_content(p), "ab");
        assert_eq!(doc.node_count(), 3);
    }

    #[test]
    fn unmatched_end_tag_is_ignored() {
        let doc = parse_html("<p>a</span>b</p>");
        let p = doc.children(doc.root())[0];
        assert_eq!(doc.text_content(p), "ab");
    }

    #[test]
    fn entities_are_decoded() {
        let doc = parse_html("<p>fish &amp; chips &lt;3</p>");
        assert_eq!(doc.text_content(doc.root()), "fish & chips <3");
    }

    #[test]
    fn script_content_is_raw() {
        let doc = parse_html("<script>if (a < b) { x() }</script><p>t</p>");
        let script = doc.children(doc.root())[0];
        assert_eq!(doc.children(script).len(), 1);
        assert_eq!(doc.text_content(script), "if (a < b) { x() }");
    }
}
