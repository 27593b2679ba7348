#![forbid(unsafe_code)]

//! HTML serialization.
//!
//! Fragments serialize as their children. Inline styles are emitted as a
//! `style` attribute (taking precedence over a literal `style` attribute).
//! Properties and listeners are not serialized.

use std::fmt::Write as _;

use v_htmlescape::escape;

use crate::document::{DocInner, Document};
use crate::node::{NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn write_node(inner: &DocInner, id: NodeId, out: &mut String) {
    let Some(data) = inner.node(id) else {
        return;
    };
    match data.kind {
        NodeKind::Text => {
            let _ = write!(out, "{}", escape(&data.text));
        }
        NodeKind::Comment => {
            out.push_str("<!--");
            out.push_str(&data.text);
            out.push_str("-->");
        }
        NodeKind::Fragment => {
            for child in &data.children {
                write_node(inner, *child, out);
            }
        }
        NodeKind::Element => {
            out.push('<');
            out.push_str(&data.tag);
            for (name, value) in &data.attrs {
                if name == "style" && !data.styles.is_empty() {
                    continue;
                }
                let _ = write!(out, " {name}=\"{}\"", escape(value));
            }
            if !data.styles.is_empty() {
                let css = data
                    .styles
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                let _ = write!(out, " style=\"{}\"", escape(&css));
            }
            out.push('>');
            if is_void(&data.tag) {
                return;
            }
            for child in &data.children {
                write_node(inner, *child, out);
            }
            out.push_str("</");
            out.push_str(&data.tag);
            out.push('>');
        }
    }
}

impl Document {
    /// Serialize `node` and its subtree.
    #[must_use]
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        write_node(&self.inner.borrow(), node, &mut out);
        out
    }

    /// Serialize only the children of `node`.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        let inner = self.inner.borrow();
        let mut out = String::new();
        if let Some(data) = inner.node(node) {
            for child in &data.children {
                write_node(&inner, *child, &mut out);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_nested_markup() {
        let doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attribute(div, "title", "a \"b\" <c>");
        let text = doc.create_text("1 < 2 & 3");
        doc.append_child(div, text);
        let br = doc.create_element("br");
        doc.append_child(div, br);
        assert_eq!(
            doc.to_html(div),
            "<div title=\"a &quot;b&quot; &lt;c&gt;\">1 &lt; 2 &amp; 3<br></div>"
        );
    }

    #[test]
    fn fragments_are_transparent() {
        let doc = Document::new();
        let ul = doc.create_element("ul");
        let frag = doc.create_fragment();
        for label in ["a", "b"] {
            let li = doc.create_element("li");
            let t = doc.create_text(label);
            doc.append_child(li, t);
            doc.append_child(frag, li);
        }
        doc.append_child(ul, frag);
        assert_eq!(doc.to_html(ul), "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(doc.inner_html(ul), "<li>a</li><li>b</li>");
    }

    #[test]
    fn styles_and_comments() {
        let doc = Document::new();
        let p = doc.create_element("p");
        doc.set_style(p, "color", "red");
        doc.set_style(p, "margin", "0");
        let c = doc.create_comment("note");
        doc.append_child(p, c);
        assert_eq!(
            doc.to_html(p),
            "<p style=\"color: red; margin: 0\"><!--note--></p>"
        );
    }
}
