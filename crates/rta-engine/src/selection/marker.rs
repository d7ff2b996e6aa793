use rta_config::PreserverConfig;

use crate::dom::{DomError, Document, MarkerId, NodeId, Point};

/// Handle on a marker node inserted by a save.
///
/// The handle only stores the marker's identity: the node itself is looked
/// up again on every use, because the mutation between save and restore may
/// have moved, cloned or dropped it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    id: MarkerId,
    /// A text node was split to make room for the marker
    split: bool,
}

impl Marker {
    pub fn id(&self) -> MarkerId {
        self.id
    }

    pub fn splits_text(&self) -> bool {
        self.split
    }

    /// Insert a fresh marker as child `index` of `parent`.
    pub(crate) fn insert(
        doc: &mut Document,
        parent: NodeId,
        index: usize,
        split: bool,
    ) -> Result<Self, DomError> {
        let id = MarkerId::new();
        let node = doc.create_marker(id);
        doc.insert_child(parent, index, node)?;
        log::trace!("inserted marker {:?} at {parent:?}[{index}]", id.0);
        Ok(Self { id, split })
    }

    /// Position of the first connected occurrence as `(parent, index)`.
    pub(crate) fn locate(&self, doc: &Document) -> Option<Point> {
        let node = doc.find_marker(self.id)?;
        Some(Point::new(doc.parent(node)?, doc.index_in_parent(node)?))
    }

    /// Remove every occurrence of the marker that still has a parent, even
    /// inside a detached subtree, keeping `points` on the same content. When
    /// the marker split a text node and the neighbours left behind are both
    /// text, they are joined again.
    pub(crate) fn release(
        &self,
        doc: &mut Document,
        config: &PreserverConfig,
        points: &mut [&mut Point],
    ) {
        let occurrences = doc.attached_markers(self.id);
        if occurrences.len() > 1 {
            log::warn!(
                "marker {:?} found {} times, only the first one was used",
                self.id.0,
                occurrences.len()
            );
        }

        for node in occurrences {
            let (Some(parent), Some(index)) = (doc.parent(node), doc.index_in_parent(node)) else {
                continue;
            };
            if let Err(err) = doc.remove_tracking(node, points) {
                log::warn!("failed to remove marker {:?}: {err}", self.id.0);
                continue;
            }
            log::trace!("removed marker {:?} from {parent:?}[{index}]", self.id.0);

            if !(self.split && config.merge_split_text) {
                continue;
            }
            let left = index.checked_sub(1).and_then(|left| doc.child(parent, left));
            let right = doc.child(parent, index);
            if let (Some(left), Some(right)) = (left, right)
                && doc.is_text(left)
                && doc.is_text(right)
                && let Err(err) = doc.merge_text_tracking(left, right, points)
            {
                log::warn!("failed to rejoin text around marker {:?}: {err}", self.id.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_then_release_leaves_no_trace() {
        let mut doc = Document::from_html("<p>ab</p>").unwrap();
        let paragraph = doc.child(doc.root(), 0).unwrap();

        let marker = Marker::insert(&mut doc, paragraph, 1, false).unwrap();
        assert_eq!(marker.locate(&doc), Some(Point::new(paragraph, 1)));
        assert_eq!(doc.to_html(), "<p>ab</p>");

        marker.release(&mut doc, &PreserverConfig::default(), &mut []);

        assert_eq!(marker.locate(&doc), None);
        assert_eq!(doc.child_count(paragraph), 1);
    }

    #[test]
    fn release_rejoins_split_text() {
        let mut doc = Document::from_html("xwiki").unwrap();
        let root = doc.root();
        let text = doc.child(root, 0).unwrap();
        doc.split_text(text, 2).unwrap();
        let marker = Marker::insert(&mut doc, root, 1, true).unwrap();

        let mut point = Point::new(root, 2);
        marker.release(&mut doc, &PreserverConfig::default(), &mut [&mut point]);

        assert_eq!(doc.child_count(root), 1);
        assert_eq!(doc.text(text), Some("xwiki"));
        assert_eq!(point, Point::new(text, 2));
    }

    #[test]
    fn release_keeps_split_text_when_merging_disabled() {
        let mut doc = Document::from_html("xwiki").unwrap();
        let root = doc.root();
        let text = doc.child(root, 0).unwrap();
        doc.split_text(text, 2).unwrap();
        let marker = Marker::insert(&mut doc, root, 1, true).unwrap();
        let config = PreserverConfig {
            merge_split_text: false,
        };

        marker.release(&mut doc, &config, &mut []);

        assert_eq!(doc.child_count(root), 2);
        assert_eq!(doc.to_html(), "xwiki");
    }

    #[test]
    fn release_removes_duplicates_too() {
        let mut doc = Document::from_html("<p>a</p><p>b</p>").unwrap();
        let root = doc.root();
        let first = doc.child(root, 0).unwrap();
        let second = doc.child(root, 1).unwrap();
        let marker = Marker::insert(&mut doc, first, 0, false).unwrap();
        let clone = doc.create_marker(marker.id());
        doc.append_child(second, clone).unwrap();

        assert_eq!(marker.locate(&doc), Some(Point::new(first, 0)));
        marker.release(&mut doc, &PreserverConfig::default(), &mut []);

        assert!(doc.find_markers(marker.id()).is_empty());
    }

    #[test]
    fn release_reaches_detached_subtrees() {
        let mut doc = Document::from_html("<p>xwiki</p>").unwrap();
        let root = doc.root();
        let paragraph = doc.child(root, 0).unwrap();
        let text = doc.child(paragraph, 0).unwrap();
        doc.split_text(text, 2).unwrap();
        let marker = Marker::insert(&mut doc, paragraph, 1, true).unwrap();
        doc.remove(paragraph).unwrap();
        assert_eq!(marker.locate(&doc), None);

        marker.release(&mut doc, &PreserverConfig::default(), &mut []);

        assert!(doc.attached_markers(marker.id()).is_empty());
        assert_eq!(doc.child_count(paragraph), 1);
        assert_eq!(doc.text(text), Some("xwiki"));
    }
}
