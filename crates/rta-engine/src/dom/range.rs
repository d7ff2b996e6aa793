//! Boundary points and ranges over the document tree.
//!
//! A [`Point`] is a `(container, offset)` pair: a character offset when the
//! container is a text node, a child index otherwise. Ordering follows the
//! DOM boundary-point rules, so a point in an element before child `i`
//! sorts before any point inside that child.

use std::cmp::Ordering;

use super::{DomError, Document, NodeId, NodeKind, char_slice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub node: NodeId,
    pub offset: usize,
}

impl Point {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A contiguous span between two points, start never after end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Point,
    pub end: Point,
}

impl Range {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    /// The range that selects `node` as a whole.
    pub fn wrapping(doc: &Document, node: NodeId) -> Result<Self, DomError> {
        let parent = doc.parent(node).ok_or(DomError::Detached(node))?;
        let index = doc.index_in_parent(node).ok_or(DomError::Detached(node))?;
        Ok(Self::new(
            Point::new(parent, index),
            Point::new(parent, index + 1),
        ))
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// The selected part of one text node: characters `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRun {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

impl Document {
    /// Order two boundary points in the document.
    ///
    /// Points in different trees have no document order. They are ordered
    /// by their tree roots, which puts every connected point first.
    pub fn compare_points(&self, a: Point, b: Point) -> Ordering {
        if a.node == b.node {
            return a.offset.cmp(&b.offset);
        }

        let (top_a, top_b) = (self.tree_root(a.node), self.tree_root(b.node));
        if top_a != top_b {
            return top_a.cmp(&top_b);
        }

        let path_a = self.path(a.node);
        let path_b = self.path(b.node);

        // a's container is an ancestor of b's
        if path_b.starts_with(&path_a) {
            let child_index = path_b[path_a.len()];
            return if a.offset <= child_index {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        if path_a.starts_with(&path_b) {
            let child_index = path_a[path_b.len()];
            return if b.offset <= child_index {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        path_a.cmp(&path_b)
    }

    /// Whether the node lies entirely inside the range.
    pub fn is_contained(&self, id: NodeId, range: &Range) -> bool {
        id != self.root
            && self.is_connected(id)
            && self
                .compare_points(Point::new(id, 0), range.start)
                .is_gt()
            && self
                .compare_points(Point::new(id, self.node_len(id)), range.end)
                .is_lt()
    }

    /// The topmost nodes lying entirely inside the range, in document order.
    pub fn contained_nodes(&self, range: &Range) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![self.root];
        while let Some(current) = stack.pop() {
            if self.is_contained(current, range) {
                result.push(current);
            } else {
                stack.extend(self.children(current).iter().rev());
            }
        }
        result
    }

    /// The selected part of every text node touched by the range, in
    /// document order. Empty runs are skipped.
    pub fn text_runs(&self, range: &Range) -> Vec<TextRun> {
        self.descendants(self.root)
            .into_iter()
            .filter_map(|id| self.text_run(id, range))
            .collect()
    }

    fn text_run(&self, id: NodeId, range: &Range) -> Option<TextRun> {
        let len = self.text(id)?.chars().count();

        let start = if id == range.start.node {
            range.start.offset
        } else if self.compare_points(range.start, Point::new(id, 0)).is_le() {
            0
        } else {
            return None;
        };
        let end = if id == range.end.node {
            range.end.offset
        } else if self.compare_points(Point::new(id, len), range.end).is_le() {
            len
        } else {
            return None;
        };

        (start < end).then_some(TextRun {
            node: id,
            start,
            end: end.min(len),
        })
    }

    /// Text covered by the range. Markers and comments contribute nothing.
    pub fn range_text(&self, range: &Range) -> String {
        self.text_runs(range)
            .into_iter()
            .filter_map(|run| {
                self.text(run.node)
                    .map(|text| char_slice(text, run.start, run.end))
            })
            .collect()
    }

    /// The innermost node containing both ends of the range.
    pub fn common_ancestor(&self, range: &Range) -> NodeId {
        let mut candidate = range.start.node;
        while !self.is_inclusive_ancestor(candidate, range.end.node) {
            match self.parent(candidate) {
                Some(parent) => candidate = parent,
                None => return self.root,
            }
        }
        candidate
    }

    /// The single child the range wraps: same element container at both
    /// ends with `end = start + 1`.
    pub fn wrapped_node(&self, range: &Range) -> Option<NodeId> {
        if range.start.node != range.end.node
            || range.end.offset != range.start.offset + 1
            || self.tag(range.start.node).is_none()
        {
            return None;
        }
        self.child(range.start.node, range.start.offset)
    }

    /// Remove everything inside the range, truncating partially selected
    /// text nodes. Returns the point where the range collapses, following
    /// the DOM `deleteContents` rules.
    pub fn delete_contents(&mut self, range: Range) -> Result<Point, DomError> {
        let Range { start, end } = range;
        if start == end {
            return Ok(start);
        }

        if start.node == end.node && self.is_text(start.node) {
            let text = self.text(start.node).ok_or(DomError::NotText(start.node))?;
            let len = text.chars().count();
            let remaining = format!(
                "{}{}",
                char_slice(text, 0, start.offset),
                char_slice(text, end.offset, len)
            );
            self.set_text(start.node, remaining)?;
            return Ok(start);
        }

        // The collapse point is either the start itself or just after the
        // start's highest ancestor that does not also contain the end.
        let reference = if self.is_inclusive_ancestor(start.node, end.node) {
            None
        } else {
            let mut reference = start.node;
            while let Some(parent) = self.parent(reference) {
                if self.is_inclusive_ancestor(parent, end.node) {
                    break;
                }
                reference = parent;
            }
            Some(reference)
        };

        let contained = self.contained_nodes(&range);

        if let Some(text) = self.text(start.node) {
            let head = char_slice(text, 0, start.offset).to_string();
            self.set_text(start.node, head)?;
        }
        if end.node != start.node
            && let Some(text) = self.text(end.node)
        {
            let len = text.chars().count();
            let tail = char_slice(text, end.offset, len).to_string();
            self.set_text(end.node, tail)?;
        }

        for node in contained {
            self.remove(node)?;
        }

        match reference {
            None => Ok(start),
            Some(reference) => {
                let parent = self.parent(reference).ok_or(DomError::Detached(reference))?;
                let index = self
                    .index_in_parent(reference)
                    .ok_or(DomError::Detached(reference))?;
                Ok(Point::new(parent, index + 1))
            }
        }
    }

    /// Markup of the range contents: partially selected elements are
    /// emitted around their selected part, markers never appear.
    pub fn range_html(&self, range: &Range) -> String {
        let mut out = String::new();
        let ancestor = self.common_ancestor(range);
        if self.is_text(ancestor) {
            if let Some(run) = self.text_run(ancestor, range)
                && let Some(text) = self.text(ancestor)
            {
                rta_markup::serialize::write_text(&mut out, char_slice(text, run.start, run.end));
            }
            return out;
        }
        for &child in self.children(ancestor) {
            self.write_range_html(child, range, &mut out);
        }
        out
    }

    fn write_range_html(&self, id: NodeId, range: &Range, out: &mut String) {
        if self.is_contained(id, range) {
            self.write_node_html(id, out);
            return;
        }
        let partial = self.is_inclusive_ancestor(id, range.start.node)
            || self.is_inclusive_ancestor(id, range.end.node);
        if !partial {
            return;
        }
        match self.kind(id) {
            Some(NodeKind::Text(text)) => {
                if let Some(run) = self.text_run(id, range) {
                    rta_markup::serialize::write_text(out, char_slice(text, run.start, run.end));
                }
            }
            Some(NodeKind::Element { tag, attrs }) => {
                rta_markup::serialize::write_open_tag(out, tag, attrs);
                for &child in self.children(id) {
                    self.write_range_html(child, range, out);
                }
                rta_markup::serialize::write_close_tag(out, tag);
            }
            Some(NodeKind::Comment(_)) | Some(NodeKind::Marker(_)) | None => {}
        }
    }
}
