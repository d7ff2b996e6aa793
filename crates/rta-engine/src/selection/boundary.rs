//! Encoding one end of a range into something that survives mutation, and
//! decoding it back into a boundary point afterwards.

use crate::dom::{DomError, Document, NodeId, Point, Range};

use super::marker::Marker;

/// Which end of the range a boundary belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// Positions to fall back on when an anchor is lost, nearest first.
///
/// The first entry is the slot the anchor occupied at save time. Each
/// further entry is the position of the previous entry's container inside
/// its own parent, up to the root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FallbackPath(Vec<(NodeId, usize)>);

impl FallbackPath {
    pub(crate) fn capture(doc: &Document, parent: NodeId, index: usize) -> Self {
        let mut entries = vec![(parent, index)];
        let mut current = parent;
        while let (Some(ancestor), Some(position)) =
            (doc.parent(current), doc.index_in_parent(current))
        {
            entries.push((ancestor, position));
            current = ancestor;
        }
        Self(entries)
    }

    pub fn entries(&self) -> &[(NodeId, usize)] {
        &self.0
    }

    /// The nearest recorded position whose container is still connected,
    /// clamped to its current child count.
    pub(crate) fn resolve(&self, doc: &Document) -> Option<Point> {
        self.0
            .iter()
            .find(|(node, _)| doc.is_connected(*node))
            .map(|&(node, index)| Point::new(node, index.min(doc.child_count(node))))
    }
}

/// One encoded end of a saved selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Boundary {
    /// A marker sits exactly at the boundary
    TextAnchor {
        marker: Marker,
        fallback: FallbackPath,
    },
    /// The boundary is one side of a control selected node. `edge_marker`
    /// brackets the node from the outside: before it for the start, after
    /// it for the end. The fallback starts at the node's parent and index.
    NodeAnchor {
        node: NodeId,
        edge_marker: Marker,
        fallback: FallbackPath,
    },
}

impl Boundary {
    /// Put a marker at a boundary point.
    ///
    /// Inside a text node the text is split around the marker; at either
    /// edge of a text node the marker becomes its sibling. Offsets past the
    /// end of the container are clamped.
    pub(crate) fn encode_text(doc: &mut Document, point: Point) -> Result<Self, DomError> {
        let offset = point.offset.min(doc.node_len(point.node));

        let (parent, index, split) = if doc.is_container(point.node) {
            (point.node, offset, false)
        } else {
            let parent = doc.parent(point.node).ok_or(DomError::Detached(point.node))?;
            let index = doc
                .index_in_parent(point.node)
                .ok_or(DomError::Detached(point.node))?;
            let len = doc.node_len(point.node);

            if doc.is_text(point.node) && offset > 0 && offset < len {
                doc.split_text(point.node, offset)?;
                (parent, index + 1, true)
            } else if offset > 0 {
                (parent, index + 1, false)
            } else {
                (parent, index, false)
            }
        };

        let fallback = FallbackPath::capture(doc, parent, index);
        let marker = Marker::insert(doc, parent, index, split)?;
        Ok(Boundary::TextAnchor { marker, fallback })
    }

    /// Anchor both ends of a control selection on the selected node.
    pub(crate) fn encode_node(doc: &mut Document, node: NodeId) -> Result<(Self, Self), DomError> {
        let parent = doc.parent(node).ok_or(DomError::Detached(node))?;
        let index = doc.index_in_parent(node).ok_or(DomError::Detached(node))?;
        let fallback = FallbackPath::capture(doc, parent, index);

        let after = Marker::insert(doc, parent, index + 1, false)?;
        let before = Marker::insert(doc, parent, index, false)?;

        Ok((
            Boundary::NodeAnchor {
                node,
                edge_marker: before,
                fallback: fallback.clone(),
            },
            Boundary::NodeAnchor {
                node,
                edge_marker: after,
                fallback,
            },
        ))
    }

    /// The marker this boundary owns in the document.
    pub fn marker(&self) -> &Marker {
        match self {
            Boundary::TextAnchor { marker, .. } => marker,
            Boundary::NodeAnchor { edge_marker, .. } => edge_marker,
        }
    }

    /// Resolve the boundary against the current tree. Never fails: a lost
    /// anchor degrades to its fallback path, then to the edge of the root.
    pub(crate) fn decode(&self, doc: &Document, edge: Edge) -> Point {
        match self {
            Boundary::TextAnchor { marker, fallback } => match marker.locate(doc) {
                Some(slot) => match edge {
                    Edge::Start => slot,
                    Edge::End => Point::new(slot.node, slot.offset + 1),
                },
                None => {
                    log::debug!("marker {:?} lost, using fallback", marker.id().0);
                    resolve_fallback(doc, fallback, edge)
                }
            },
            Boundary::NodeAnchor {
                node,
                edge_marker,
                fallback,
            } => {
                if doc.is_connected(*node)
                    && let Ok(range) = Range::wrapping(doc, *node)
                {
                    return match edge {
                        Edge::Start => range.start,
                        Edge::End => range.end,
                    };
                }
                log::debug!("selected node {node:?} is gone, trying its edge marker");
                match edge_marker.locate(doc) {
                    // The start marker sat before the node, the end marker after it
                    Some(slot) => match edge {
                        Edge::Start => Point::new(slot.node, slot.offset + 1),
                        Edge::End => slot,
                    },
                    None => resolve_fallback(doc, fallback, edge),
                }
            }
        }
    }
}

fn resolve_fallback(doc: &Document, fallback: &FallbackPath, edge: Edge) -> Point {
    if let Some(point) = fallback.resolve(doc) {
        log::debug!("resolved {edge:?} boundary to fallback position {point:?}");
        return point;
    }
    log::debug!("no fallback position survived, using the {edge:?} of the root");
    let root = doc.root();
    match edge {
        Edge::Start => Point::new(root, 0),
        Edge::End => Point::new(root, doc.child_count(root)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::inside_text(2, "to", "ucan", true)]
    #[case::text_start(0, "", "toucan", false)]
    #[case::text_end(6, "toucan", "", false)]
    #[case::clamped_past_end(9, "toucan", "", false)]
    fn encode_text_places_marker_at_offset(
        #[case] offset: usize,
        #[case] before: &str,
        #[case] after: &str,
        #[case] split: bool,
    ) {
        let mut doc = Document::from_html("toucan").unwrap();
        let root = doc.root();
        let text = doc.child(root, 0).unwrap();

        let boundary = Boundary::encode_text(&mut doc, Point::new(text, offset)).unwrap();

        let slot = boundary.marker().locate(&doc).unwrap();
        let text_before: String = doc.children(root)[..slot.offset]
            .iter()
            .filter_map(|&node| doc.text(node))
            .collect();
        let text_after: String = doc.children(root)[slot.offset + 1..]
            .iter()
            .filter_map(|&node| doc.text(node))
            .collect();
        assert_eq!(text_before, before);
        assert_eq!(text_after, after);
        assert_eq!(boundary.marker().splits_text(), split);
        assert_eq!(doc.to_html(), "toucan");
    }

    #[test]
    fn encode_text_in_empty_container_adds_direct_child() {
        let mut doc = Document::from_html("").unwrap();
        let root = doc.root();

        let boundary = Boundary::encode_text(&mut doc, Point::new(root, 0)).unwrap();

        assert_eq!(doc.child_count(root), 1);
        assert_eq!(boundary.decode(&doc, Edge::Start), Point::new(root, 0));
        assert_eq!(boundary.decode(&doc, Edge::End), Point::new(root, 1));
    }

    #[test]
    fn encode_text_rejects_detached_text() {
        let mut doc = Document::from_html("").unwrap();
        let text = doc.create_text("loose");

        let err = Boundary::encode_text(&mut doc, Point::new(text, 2)).unwrap_err();

        assert!(matches!(err, DomError::Detached(_)));
    }

    #[test]
    fn fallback_path_lists_ancestors_nearest_first() {
        let doc = Document::from_html("a<div><p>b</p></div>").unwrap();
        let root = doc.root();
        let div = doc.child(root, 1).unwrap();
        let paragraph = doc.child(div, 0).unwrap();

        let path = FallbackPath::capture(&doc, paragraph, 1);

        assert_eq!(path.entries(), &[(paragraph, 1), (div, 0), (root, 1)]);
    }

    #[test]
    fn lost_marker_falls_back_to_nearest_surviving_ancestor() {
        let mut doc = Document::from_html("a<div><p>bc</p></div>").unwrap();
        let root = doc.root();
        let div = doc.child(root, 1).unwrap();
        let paragraph = doc.child(div, 0).unwrap();
        let text = doc.child(paragraph, 0).unwrap();
        let boundary = Boundary::encode_text(&mut doc, Point::new(text, 1)).unwrap();

        doc.remove(paragraph).unwrap();

        assert_eq!(boundary.decode(&doc, Edge::Start), Point::new(div, 0));
        assert_eq!(boundary.decode(&doc, Edge::End), Point::new(div, 0));
    }

    #[test]
    fn node_anchor_prefers_node_then_edge_marker_then_fallback() {
        let mut doc = Document::from_html("pq<img src=\"a.gif\">r").unwrap();
        let root = doc.root();
        let image = doc.child(root, 1).unwrap();

        let (start, end) = Boundary::encode_node(&mut doc, image).unwrap();
        assert_eq!(doc.child(root, 2), Some(image));
        assert_eq!(start.decode(&doc, Edge::Start), Point::new(root, 2));
        assert_eq!(end.decode(&doc, Edge::End), Point::new(root, 3));

        // Replacement between the edge markers
        doc.remove(image).unwrap();
        let replacement = doc.create_element("img");
        doc.insert_child(root, 2, replacement).unwrap();
        assert_eq!(start.decode(&doc, Edge::Start), Point::new(root, 2));
        assert_eq!(end.decode(&doc, Edge::End), Point::new(root, 3));

        // Everything gone: back to where the node used to be
        for child in doc.children(root).to_vec() {
            doc.remove(child).unwrap();
        }
        assert_eq!(start.decode(&doc, Edge::Start), Point::new(root, 0));
        assert_eq!(end.decode(&doc, Edge::End), Point::new(root, 0));
    }
}
