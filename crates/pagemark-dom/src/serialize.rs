//! HTML serialization.

use crate::document::Document;
use crate::node::{NodeData, NodeId};
use crate::parser::{is_raw_text_element, is_void_element};

pub(crate) fn outer_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &mut out);
    out
}

pub(crate) fn inner_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for child in doc.children(id) {
        write_node(doc, *child, &mut out);
    }
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match &doc[id].data {
        NodeData::Document => {
            for child in doc.children(id) {
                write_node(doc, *child, out);
            }
        }
        NodeData::Text(text) => {
            let raw = doc
                .parent(id)
                .and_then(|parent| doc[parent].tag_name())
                .is_some_and(is_raw_text_element);
            if raw {
                out.push_str(text);
            } else {
                out.push_str(&html_escape::encode_text(text));
            }
        }
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for attr in &element.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(&attr.value));
                out.push('"');
            }
            out.push('>');
            if is_void_element(&element.name) {
                return;
            }
            for child in doc.children(id) {
                write_node(doc, *child, out);
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parse_html;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_back_to_markup() {
        let source = r#"<div class="a"><p>x<br>y</p></div>"#;
        let doc = parse_html(source);
        assert_eq!(doc.to_html(), source);
    }

    #[test]
    fn escapes_text_and_attributes() {
        let doc = parse_html(r#"<p title="&quot;q&quot;">a &lt; b</p>"#);
        insta::assert_snapshot!(doc.to_html(), @r#"<p title="&quot;q&quot;">a &lt; b</p>"#);
    }

    #[test]
    fn script_and_style_text_is_written_verbatim() {
        let source = "<style>p > b { color: red }</style><script>if (a < b && c) {}</script><p>a &amp; b</p>";
        let doc = parse_html(source);
        insta::assert_snapshot!(doc.to_html(), @"<style>p > b { color: red }</style><script>if (a < b && c) {}</script><p>a &amp; b</p>");
    }
}
