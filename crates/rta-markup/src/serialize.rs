//! Writing markup back out.
//!
//! Shared by [`MarkupNode::to_html`] and by any tree that wants to emit the
//! same canonical form: lowercase tag names, double-quoted attributes, void
//! elements without a closing tag.

use crate::parser::MarkupNode;

/// Elements that never have content or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn write_text(out: &mut String, text: &str) {
    out.push_str(&html_escape::encode_text(text));
}

pub fn write_comment(out: &mut String, body: &str) {
    out.push_str("<!--");
    out.push_str(body);
    out.push_str("-->");
}

pub fn write_open_tag(out: &mut String, tag: &str, attrs: &[(String, String)]) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }
    out.push('>');
}

/// Closing tag, omitted for void elements.
pub fn write_close_tag(out: &mut String, tag: &str) {
    if is_void_element(tag) {
        return;
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

impl MarkupNode {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            MarkupNode::Text(text) => write_text(out, text),
            MarkupNode::Comment(body) => write_comment(out, body),
            MarkupNode::Element {
                tag,
                attrs,
                children,
            } => {
                write_open_tag(out, tag, attrs);
                for child in children {
                    child.write_html(out);
                }
                write_close_tag(out, tag);
            }
        }
    }
}
