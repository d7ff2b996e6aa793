//! In-memory document tree backing the rich text area.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Removing a node detaches it from its parent but keeps its
//! data, so references held across a mutation can still be asked whether
//! they are connected to the root.
//!
//! The tree knows four kinds of node. [`NodeKind::Marker`] is the invisible
//! sentinel used by the selection preserver: it has no text, is skipped by
//! every serializer and never merges with neighbouring text.

mod range;
mod serialize;

pub use range::{Point, Range, TextRun};

use rta_config::EditorConfig;
use rta_markup::{MarkupError, MarkupNode, is_void_element, parse_fragment};
use uuid::Uuid;

use crate::editing::History;

/// Index of a node in the document arena
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Identity of a selection marker, unique across documents
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct MarkerId(pub(crate) Uuid);

impl MarkerId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
    Marker(MarkerId),
}

#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),
    #[error("Node {0:?} cannot have children")]
    NotAContainer(NodeId),
    #[error("Node {0:?} is not a text node")]
    NotText(NodeId),
    #[error("Node {0:?} has no parent")]
    Detached(NodeId),
    #[error("Offset {offset} is out of range for node {node:?} of length {len}")]
    OffsetOutOfRange {
        node: NodeId,
        offset: usize,
        len: usize,
    },
    #[error("Inserting {child:?} into {parent:?} would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    #[error("Markup error: {0}")]
    Markup(#[from] MarkupError),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The editable document: a node tree rooted at a `body` element, plus the
/// live selection and the undo history of the commands applied to it.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    selection: Option<Range>,
    atomic_elements: Vec<String>,
    pub(crate) history: History,
    pub(crate) version: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with the built-in configuration
    pub fn new() -> Self {
        Self::with_config(&EditorConfig::default())
    }

    pub fn with_config(config: &EditorConfig) -> Self {
        let root = NodeData {
            kind: NodeKind::Element {
                tag: "body".to_string(),
                attrs: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            selection: Some(Range::collapsed(Point::new(NodeId(0), 0))),
            atomic_elements: config.atomic_elements.clone(),
            history: History::new(config.history_limit),
            version: 0,
        }
    }

    /// Create a document from markup, caret at the start
    pub fn from_html(html: &str) -> anyhow::Result<Self> {
        let mut doc = Self::new();
        doc.set_html(html)?;
        Ok(doc)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    // --- Node queries ---

    fn data(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn data_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|data| &data.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|data| data.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|data| data.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(attr, _)| attr == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text(_)))
    }

    pub fn is_marker(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Marker(_)))
    }

    /// Whether the node is an element selected as a whole, like an image.
    pub fn is_atomic(&self, id: NodeId) -> bool {
        self.tag(id)
            .is_some_and(|tag| self.atomic_elements.iter().any(|atomic| atomic == tag))
    }

    /// Whether the node may hold children: non-void elements only.
    pub fn is_container(&self, id: NodeId) -> bool {
        self.tag(id).is_some_and(|tag| !is_void_element(tag))
    }

    /// Length used by boundary offsets: characters for text and comments,
    /// children for everything else.
    pub fn node_len(&self, id: NodeId) -> usize {
        match self.kind(id) {
            Some(NodeKind::Text(text)) | Some(NodeKind::Comment(text)) => text.chars().count(),
            Some(_) => self.child_count(id),
            None => 0,
        }
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether the node is still part of the document tree.
    pub fn is_connected(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len() && self.is_inclusive_ancestor(self.root, id)
    }

    /// Ancestors from the parent up to the top of the node's tree.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            result.push(parent);
            current = self.parent(parent);
        }
        result
    }

    /// The topmost ancestor of the node: the root when it is connected.
    pub(crate) fn tree_root(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().copied().unwrap_or(id)
    }

    /// Child indexes leading from the top of the node's tree down to the node.
    pub(crate) fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let (Some(parent), Some(index)) = (self.parent(current), self.index_in_parent(current))
        {
            path.push(index);
            current = parent;
        }
        path.reverse();
        path
    }

    /// The node and its descendants in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        result
    }

    /// Every connected node carrying the given marker, in document order.
    pub fn find_markers(&self, marker: MarkerId) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.kind(id) == Some(&NodeKind::Marker(marker)))
            .collect()
    }

    /// Every node carrying the given marker that still has a parent: the
    /// connected ones in document order, then those inside detached subtrees.
    pub(crate) fn attached_markers(&self, marker: MarkerId) -> Vec<NodeId> {
        let mut result = self.find_markers(marker);
        result.extend((0..self.nodes.len()).map(NodeId).filter(|&id| {
            self.kind(id) == Some(&NodeKind::Marker(marker))
                && self.parent(id).is_some()
                && !self.is_connected(id)
        }));
        result
    }

    /// First connected node carrying the given marker, in document order.
    pub fn find_marker(&self, marker: MarkerId) -> Option<NodeId> {
        self.find_markers(marker).into_iter().next()
    }

    /// Concatenated text of the node's subtree; markers and comments add nothing.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    // --- Node creation ---

    fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    pub fn create_element_with_attrs(&mut self, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.create(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.create(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, body: &str) -> NodeId {
        self.create(NodeKind::Comment(body.to_string()))
    }

    /// Create a detached marker node for the selection preserver.
    pub(crate) fn create_marker(&mut self, marker: MarkerId) -> NodeId {
        self.create(NodeKind::Marker(marker))
    }

    /// Build detached nodes from parsed markup, returning the top-level ones.
    pub(crate) fn build_nodes(&mut self, fragment: &[MarkupNode]) -> Vec<NodeId> {
        let mut result = Vec::with_capacity(fragment.len());
        for node in fragment {
            let id = match node {
                MarkupNode::Text(text) => self.create_text(text),
                MarkupNode::Comment(body) => self.create_comment(body),
                MarkupNode::Element {
                    tag,
                    attrs,
                    children,
                } => {
                    let element = self.create_element_with_attrs(tag, attrs.clone());
                    let built = self.build_nodes(children);
                    for child in built {
                        self.attach(element, None, child);
                    }
                    element
                }
            };
            result.push(id);
        }
        result
    }

    // --- Tree mutation ---

    /// Link a detached child under `parent` without live-range bookkeeping.
    fn attach(&mut self, parent: NodeId, index: Option<usize>, child: NodeId) {
        let children = &mut self.nodes[parent.0].children;
        match index {
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `child` at `index` among the children of `parent`, moving it
    /// out of its current position first. The live selection is updated the
    /// way DOM live ranges are.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DomError> {
        self.data(child)?;
        if !self.is_container(parent) {
            return Err(DomError::NotAContainer(parent));
        }
        if child == self.root || self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }

        let mut index = index;
        if self.parent(child) == Some(parent)
            && self.index_in_parent(child).is_some_and(|old| old < index)
        {
            index -= 1;
        }
        if self.parent(child).is_some() {
            self.remove(child)?;
        }

        let len = self.child_count(parent);
        if index > len {
            return Err(DomError::OffsetOutOfRange {
                node: parent,
                offset: index,
                len,
            });
        }

        self.attach(parent, Some(index), child);
        if let Some(mut range) = self.selection {
            for point in [&mut range.start, &mut range.end] {
                if point.node == parent && point.offset > index {
                    point.offset += 1;
                }
            }
            self.selection = Some(range);
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let index = self.child_count(parent);
        self.insert_child(parent, index, child)
    }

    /// Detach a node from its parent. The live selection is updated the way
    /// DOM live ranges are.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        self.remove_tracking(id, &mut [])
    }

    /// Detach a node and move the live selection plus the given boundary
    /// points so they stay valid: points inside the removed subtree collapse
    /// to where it was, points after it in the same parent shift left.
    pub fn remove_tracking(
        &mut self,
        id: NodeId,
        points: &mut [&mut Point],
    ) -> Result<(), DomError> {
        let parent = self.data(id)?.parent.ok_or(DomError::Detached(id))?;
        let index = self.index_in_parent(id).ok_or(DomError::Detached(id))?;

        self.data_mut(parent)?.children.remove(index);
        self.data_mut(id)?.parent = None;

        let mut selection = self.selection;
        if let Some(range) = selection.as_mut() {
            self.track_removal(id, parent, index, &mut range.start);
            self.track_removal(id, parent, index, &mut range.end);
        }
        self.selection = selection;
        for point in points.iter_mut() {
            self.track_removal(id, parent, index, &mut **point);
        }
        Ok(())
    }

    fn track_removal(&self, removed: NodeId, parent: NodeId, index: usize, point: &mut Point) {
        if self.is_inclusive_ancestor(removed, point.node) {
            *point = Point::new(parent, index);
        } else if point.node == parent && point.offset > index {
            point.offset -= 1;
        }
    }

    /// Split a text node at a character offset. The original keeps the head,
    /// the returned new node holds the tail and is inserted right after it.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let text = self.text(id).ok_or(DomError::NotText(id))?;
        let len = text.chars().count();
        if offset > len {
            return Err(DomError::OffsetOutOfRange {
                node: id,
                offset,
                len,
            });
        }
        let parent = self.parent(id).ok_or(DomError::Detached(id))?;
        let index = self.index_in_parent(id).ok_or(DomError::Detached(id))?;

        let split_at = byte_index(text, offset);
        let tail = text[split_at..].to_string();
        let head = text[..split_at].to_string();

        let new_node = self.create_text(&tail);
        self.insert_child(parent, index + 1, new_node)?;

        if let Some(mut range) = self.selection {
            for point in [&mut range.start, &mut range.end] {
                if point.node == id && point.offset > offset {
                    *point = Point::new(new_node, point.offset - offset);
                } else if point.node == parent && point.offset == index + 1 {
                    point.offset += 1;
                }
            }
            self.selection = Some(range);
        }
        self.set_text(id, head)?;
        Ok(new_node)
    }

    /// Replace the data of a text node. Selection offsets past the new end
    /// are clamped.
    pub fn set_text(&mut self, id: NodeId, text: String) -> Result<(), DomError> {
        let len = text.chars().count();
        match &mut self.data_mut(id)?.kind {
            NodeKind::Text(data) => *data = text,
            _ => return Err(DomError::NotText(id)),
        }
        if let Some(mut range) = self.selection {
            for point in [&mut range.start, &mut range.end] {
                if point.node == id {
                    point.offset = point.offset.min(len);
                }
            }
            self.selection = Some(range);
        }
        Ok(())
    }

    /// Append the text of `right` to `left` and remove `right`, keeping the
    /// given boundary points on the same characters.
    pub fn merge_text_tracking(
        &mut self,
        left: NodeId,
        right: NodeId,
        points: &mut [&mut Point],
    ) -> Result<(), DomError> {
        let left_text = self.text(left).ok_or(DomError::NotText(left))?;
        let right_text = self.text(right).ok_or(DomError::NotText(right))?;
        let left_len = left_text.chars().count();
        let merged = format!("{left_text}{right_text}");

        let parent = self.parent(right).ok_or(DomError::Detached(right))?;
        let right_index = self.index_in_parent(right).ok_or(DomError::Detached(right))?;

        let remap = |point: &mut Point| {
            if point.node == right {
                *point = Point::new(left, left_len + point.offset);
            } else if point.node == parent && point.offset == right_index {
                *point = Point::new(left, left_len);
            }
        };
        if let Some(mut range) = self.selection {
            remap(&mut range.start);
            remap(&mut range.end);
            self.selection = Some(range);
        }
        for point in points.iter_mut() {
            remap(&mut **point);
        }

        self.set_text(left, merged)?;
        self.remove_tracking(right, points)
    }

    /// Replace the content of the root with parsed markup, caret at the start.
    /// History is cleared: this is a document replacement, not an edit.
    pub fn set_html(&mut self, html: &str) -> Result<(), DomError> {
        self.replace_content(html)?;
        self.history.clear();
        Ok(())
    }

    pub(crate) fn replace_content(&mut self, html: &str) -> Result<(), DomError> {
        let fragment = parse_fragment(html)?;
        for child in self.children(self.root).to_vec() {
            self.remove(child)?;
        }
        for node in self.build_nodes(&fragment) {
            self.attach(self.root, None, node);
        }
        self.selection = Some(Range::collapsed(Point::new(self.root, 0)));
        Ok(())
    }

    // --- Selection ---

    pub fn selection(&self) -> Option<Range> {
        self.selection
    }

    /// Install a range as the live selection, replacing any existing one.
    /// Offsets are clamped to the node length and a reversed range is
    /// normalised so that start precedes end.
    pub fn set_selection(&mut self, range: Range) {
        let start = self.clamp_point(range.start);
        let end = self.clamp_point(range.end);
        self.selection = Some(if self.compare_points(start, end).is_gt() {
            Range::new(end, start)
        } else {
            Range::new(start, end)
        });
    }

    /// Select a node as a whole: (parent, index) to (parent, index + 1).
    pub fn select_node(&mut self, id: NodeId) -> Result<Range, DomError> {
        let range = Range::wrapping(self, id)?;
        self.selection = Some(range);
        Ok(range)
    }

    /// Select everything inside a node.
    pub fn select_node_contents(&mut self, id: NodeId) -> Result<Range, DomError> {
        self.data(id)?;
        let range = Range::new(Point::new(id, 0), Point::new(id, self.node_len(id)));
        self.selection = Some(range);
        Ok(range)
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Text covered by the live selection, empty when there is none.
    pub fn selection_text(&self) -> String {
        self.selection
            .map(|range| self.range_text(&range))
            .unwrap_or_default()
    }

    fn clamp_point(&self, point: Point) -> Point {
        Point::new(point.node, point.offset.min(self.node_len(point.node)))
    }
}

/// Byte index of a character offset, or the string length past the end.
pub(crate) fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(index, _)| index)
}

/// Characters `start..end` of a string.
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let from = byte_index(text, start);
    let to = byte_index(text, end).max(from);
    &text[from..to]
}
