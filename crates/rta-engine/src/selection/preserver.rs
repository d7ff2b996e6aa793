use rta_config::PreserverConfig;

use crate::dom::{DomError, Document, NodeId, NodeKind, Point, Range};

use super::boundary::{Boundary, Edge};
use super::snapshot::SelectionSnapshot;

/// Save the live selection of `doc` by anchoring both of its ends.
///
/// Markers are inserted into the document, which never changes its text or
/// markup. The live selection is re-installed strictly between the two
/// markers so that a command replacing the selection leaves them in place.
pub fn save(doc: &mut Document, config: &PreserverConfig) -> SelectionSnapshot {
    let Some(range) = doc.selection() else {
        return SelectionSnapshot::Empty;
    };

    let (start, end) = match encode(doc, range, config) {
        Ok(boundaries) => boundaries,
        Err(err) => {
            log::warn!("could not save selection {range:?}: {err}");
            return SelectionSnapshot::Empty;
        }
    };

    let after_start = start
        .marker()
        .locate(doc)
        .map(|slot| Point::new(slot.node, slot.offset + 1));
    let before_end = end.marker().locate(doc);
    if let (Some(from), Some(to)) = (after_start, before_end) {
        doc.set_selection(Range::new(from, to));
    }

    SelectionSnapshot::Range { start, end }
}

/// End first, so splitting text for the end never moves the start.
fn encode(
    doc: &mut Document,
    range: Range,
    config: &PreserverConfig,
) -> Result<(Boundary, Boundary), DomError> {
    if let Some(node) = doc
        .wrapped_node(&range)
        .filter(|&node| doc.is_atomic(node))
    {
        return Boundary::encode_node(doc, node);
    }

    let end = Boundary::encode_text(doc, range.end)?;
    match Boundary::encode_text(doc, range.start) {
        Ok(start) => Ok((start, end)),
        Err(err) => {
            end.marker().release(doc, config, &mut []);
            Err(err)
        }
    }
}

/// Resolve a snapshot against the current tree, release its markers and
/// install the resulting selection. Returns the installed range, or `None`
/// for an empty snapshot.
pub fn restore(
    doc: &mut Document,
    snapshot: SelectionSnapshot,
    config: &PreserverConfig,
) -> Option<Range> {
    let SelectionSnapshot::Range { start, end } = snapshot else {
        return None;
    };

    let mut from = start.decode(doc, Edge::Start);
    let mut to = end.decode(doc, Edge::End);

    start.marker().release(doc, config, &mut [&mut from, &mut to]);
    end.marker().release(doc, config, &mut [&mut from, &mut to]);

    if doc.compare_points(from, to).is_gt() {
        log::debug!("restored start {from:?} is after end {to:?}, collapsing");
        to = from;
    }

    let range = promote(doc, Range::new(from, to));
    doc.set_selection(range);
    doc.selection()
}

/// Release the markers of a snapshot without touching the selection.
pub fn discard(doc: &mut Document, snapshot: SelectionSnapshot, config: &PreserverConfig) {
    for marker in snapshot.markers() {
        marker.release(doc, config, &mut []);
    }
}

/// A range whose only content is one atomic element becomes a control
/// selection of that element. Whitespace-only text and comments don't count.
fn promote(doc: &Document, range: Range) -> Range {
    let mut content = doc
        .contained_nodes(&range)
        .into_iter()
        .filter(|&node| !is_insignificant(doc, node));

    let (Some(node), None) = (content.next(), content.next()) else {
        return range;
    };
    if !doc.is_atomic(node) || !doc.range_text(&range).trim().is_empty() {
        return range;
    }
    Range::wrapping(doc, node).unwrap_or(range)
}

fn is_insignificant(doc: &Document, node: NodeId) -> bool {
    match doc.kind(node) {
        Some(NodeKind::Text(text)) => text.trim().is_empty(),
        Some(NodeKind::Comment(_)) | Some(NodeKind::Marker(_)) => true,
        _ => false,
    }
}

/// Keeps the selection of a document across a mutation.
///
/// ```rust
/// use rta_config::PreserverConfig;
/// use rta_engine::dom::{Document, Point, Range};
/// use rta_engine::editing::Cmd;
/// use rta_engine::selection::SelectionPreserver;
///
/// let mut doc = Document::from_html("toucan").unwrap();
/// let text = doc.child(doc.root(), 0).unwrap();
/// doc.set_selection(Range::new(Point::new(text, 0), Point::new(text, 2)));
///
/// let mut preserver = SelectionPreserver::new(PreserverConfig::default());
/// preserver.save_selection(&mut doc);
/// doc.apply(Cmd::InsertHtml("<ins>the</ins> <em>To</em>".to_string()))
///     .unwrap();
/// preserver.restore_selection(&mut doc);
///
/// assert_eq!(doc.selection_text(), "the To");
/// ```
#[derive(Debug, Default)]
pub struct SelectionPreserver {
    config: PreserverConfig,
    snapshot: Option<SelectionSnapshot>,
}

impl SelectionPreserver {
    pub fn new(config: PreserverConfig) -> Self {
        Self {
            config,
            snapshot: None,
        }
    }

    /// Save the live selection. A snapshot that was never restored is
    /// discarded first: the last save wins.
    pub fn save_selection(&mut self, doc: &mut Document) {
        if let Some(previous) = self.snapshot.take() {
            log::debug!("discarding unrestored selection snapshot");
            discard(doc, previous, &self.config);
        }
        self.snapshot = Some(save(doc, &self.config));
    }

    /// Restore the last saved selection. Does nothing without a prior save.
    pub fn restore_selection(&mut self, doc: &mut Document) -> Option<Range> {
        let snapshot = self.snapshot.take()?;
        restore(doc, snapshot, &self.config)
    }

    /// Drop the last saved selection, releasing its markers.
    pub fn discard_selection(&mut self, doc: &mut Document) {
        if let Some(snapshot) = self.snapshot.take() {
            discard(doc, snapshot, &self.config);
        }
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn marker_count(doc: &Document) -> usize {
        doc.descendants(doc.root())
            .into_iter()
            .filter(|&node| doc.is_marker(node))
            .count()
    }

    #[test]
    fn save_without_selection_is_empty() {
        let mut doc = Document::from_html("xwiki").unwrap();
        doc.clear_selection();

        let snapshot = save(&mut doc, &PreserverConfig::default());

        assert!(snapshot.is_empty());
        assert_eq!(marker_count(&doc), 0);
        assert_eq!(restore(&mut doc, snapshot, &PreserverConfig::default()), None);
    }

    #[test]
    fn save_keeps_selection_between_markers() {
        let mut doc = Document::from_html("toucan").unwrap();
        let text = doc.child(doc.root(), 0).unwrap();
        doc.set_selection(Range::new(Point::new(text, 0), Point::new(text, 2)));

        let snapshot = save(&mut doc, &PreserverConfig::default());

        assert_eq!(marker_count(&doc), 2);
        assert_eq!(doc.selection_text(), "to");
        let selection = doc.selection().unwrap();
        assert_eq!(doc.range_html(&selection), "to");
        assert_eq!(doc.to_html(), "toucan");
        discard(&mut doc, snapshot, &PreserverConfig::default());
    }

    #[test]
    fn save_of_detached_selection_leaves_no_markers() {
        let mut doc = Document::from_html("<p>abc</p>").unwrap();
        let paragraph = doc.child(doc.root(), 0).unwrap();
        let loose = doc.create_text("loose");
        doc.set_selection(Range::new(Point::new(paragraph, 0), Point::new(loose, 1)));

        let snapshot = save(&mut doc, &PreserverConfig::default());

        assert!(snapshot.is_empty());
        assert_eq!(marker_count(&doc), 0);
        assert_eq!(doc.to_html(), "<p>abc</p>");
    }

    #[test]
    fn save_of_selection_from_root_into_detached_text_is_empty() {
        let mut doc = Document::from_html("<p>abc</p>").unwrap();
        let root = doc.root();
        let loose = doc.create_text("loose");
        doc.set_selection(Range::new(Point::new(root, 0), Point::new(loose, 1)));

        let snapshot = save(&mut doc, &PreserverConfig::default());

        assert!(snapshot.is_empty());
        assert_eq!(marker_count(&doc), 0);
        assert_eq!(doc.to_html(), "<p>abc</p>");
    }

    #[test]
    fn duplicated_marker_uses_first_occurrence() {
        let mut doc = Document::from_html("<p>one</p><p>two</p>").unwrap();
        let root = doc.root();
        let first = doc.child(root, 0).unwrap();
        let second = doc.child(root, 1).unwrap();
        let text = doc.child(first, 0).unwrap();
        doc.select_node_contents(text).unwrap();
        let config = PreserverConfig::default();

        let snapshot = save(&mut doc, &config);
        let end_id = snapshot.markers()[1].id();
        let clone = doc.create_marker(end_id);
        doc.append_child(second, clone).unwrap();
        let restored = restore(&mut doc, snapshot, &config);

        assert_eq!(
            restored,
            Some(Range::new(Point::new(first, 0), Point::new(first, 1)))
        );
        assert_eq!(doc.selection_text(), "one");
        assert_eq!(marker_count(&doc), 0);
    }

    #[test]
    fn promote_ignores_whitespace_and_comments() {
        let doc = Document::from_html("a <!--c--><img src=\"a.gif\"> b").unwrap();
        let root = doc.root();
        let first = doc.child(root, 0).unwrap();
        let last = doc.child(root, 3).unwrap();
        let range = Range::new(Point::new(first, 1), Point::new(last, 1));

        assert_eq!(
            promote(&doc, range),
            Range::new(Point::new(root, 2), Point::new(root, 3))
        );
    }

    #[test]
    fn promote_leaves_text_ranges_alone() {
        let doc = Document::from_html("a<img src=\"a.gif\">b").unwrap();
        let root = doc.root();
        let first = doc.child(root, 0).unwrap();
        let range = Range::new(Point::new(first, 0), Point::new(root, 2));

        assert_eq!(promote(&doc, range), range);
    }

    #[test]
    fn promote_needs_an_atomic_element() {
        let doc = Document::from_html("<span></span>").unwrap();
        let root = doc.root();
        let range = Range::new(Point::new(root, 0), Point::new(root, 1));

        assert_eq!(promote(&doc, range), range);
    }

    #[test]
    fn preserver_restore_without_save_is_a_no_op() {
        let mut doc = Document::from_html("xwiki").unwrap();
        let text = doc.child(doc.root(), 0).unwrap();
        let range = Range::new(Point::new(text, 1), Point::new(text, 3));
        doc.set_selection(range);
        let mut preserver = SelectionPreserver::default();

        assert_eq!(preserver.restore_selection(&mut doc), None);
        assert_eq!(doc.selection(), Some(range));
    }

    #[test]
    fn preserver_last_save_wins() {
        let mut doc = Document::from_html("xwiki").unwrap();
        let text = doc.child(doc.root(), 0).unwrap();
        doc.set_selection(Range::new(Point::new(text, 1), Point::new(text, 3)));
        let mut preserver = SelectionPreserver::default();

        preserver.save_selection(&mut doc);
        preserver.save_selection(&mut doc);

        assert!(preserver.has_snapshot());
        assert_eq!(marker_count(&doc), 2);

        preserver.restore_selection(&mut doc);

        assert!(!preserver.has_snapshot());
        assert_eq!(marker_count(&doc), 0);
        assert_eq!(doc.selection_text(), "wi");
        assert_eq!(doc.child_count(doc.root()), 1);
    }
}
