use rta_markup::serialize::{write_close_tag, write_comment, write_open_tag, write_text};

use super::{Document, NodeId, NodeKind};

impl Document {
    /// Markup of the whole document (the root's inner HTML). Markers never
    /// appear in the output.
    pub fn to_html(&self) -> String {
        self.inner_html(self.root)
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node_html(child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node_html(id, &mut out);
        out
    }

    pub(crate) fn write_node_html(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => write_text(out, text),
            Some(NodeKind::Comment(body)) => write_comment(out, body),
            Some(NodeKind::Element { tag, attrs }) => {
                write_open_tag(out, tag, attrs);
                for &child in self.children(id) {
                    self.write_node_html(child, out);
                }
                write_close_tag(out, tag);
            }
            Some(NodeKind::Marker(_)) | None => {}
        }
    }
}
