use rta_markup::parse_fragment;

use crate::dom::{DomError, Document, NodeId, Point, Range, TextRun};
use crate::editing::Patch;

/// Edit commands the rich text area understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Replace the selection with parsed markup, caret after it
    InsertHtml(String),
    /// Wrap the selected text in `<strong>`
    Bold,
}

impl Cmd {
    pub fn label(&self) -> &'static str {
        match self {
            Cmd::InsertHtml(_) => "insert_html",
            Cmd::Bold => "bold",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Command {0} needs a selection")]
    NoSelection(&'static str),
    #[error(transparent)]
    Dom(#[from] DomError),
}

impl From<rta_markup::MarkupError> for CommandError {
    fn from(err: rta_markup::MarkupError) -> Self {
        CommandError::Dom(DomError::Markup(err))
    }
}

impl Document {
    /// Apply a command to the document.
    ///
    /// A successful command records exactly one history entry and bumps the
    /// document version. A failing command leaves history untouched.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, CommandError> {
        let range = self.selection().ok_or(CommandError::NoSelection(cmd.label()))?;
        let before = self.to_html();

        let changed = match &cmd {
            Cmd::InsertHtml(html) => self.insert_html(range, html)?,
            Cmd::Bold => self.bold(range)?,
        };

        self.history.record(cmd.label(), before, self.to_html());
        self.version += 1;
        log::trace!("applied {} at version {}", cmd.label(), self.version);

        Ok(Patch {
            changed,
            new_selection: self.selection(),
            version: self.version,
        })
    }

    fn insert_html(&mut self, range: Range, html: &str) -> Result<Vec<NodeId>, CommandError> {
        // Parse before touching the tree so bad markup changes nothing
        let fragment = parse_fragment(html)?;

        let point = self.delete_contents(range)?;
        let (parent, mut index) = self.insertion_slot(point)?;

        let nodes = self.build_nodes(&fragment);
        for &node in &nodes {
            self.insert_child(parent, index, node)?;
            index += 1;
        }
        self.set_selection(Range::collapsed(Point::new(parent, index)));
        Ok(nodes)
    }

    /// Where new children go for a point: the point itself in an element,
    /// the parent around a text node (splitting it when the point is inside).
    fn insertion_slot(&mut self, point: Point) -> Result<(NodeId, usize), DomError> {
        if self.is_container(point.node) {
            return Ok((point.node, point.offset));
        }
        let parent = self.parent(point.node).ok_or(DomError::Detached(point.node))?;
        let index = self
            .index_in_parent(point.node)
            .ok_or(DomError::Detached(point.node))?;

        if self.is_text(point.node) {
            let len = self.node_len(point.node);
            if point.offset == 0 {
                return Ok((parent, index));
            }
            if point.offset < len {
                self.split_text(point.node, point.offset)?;
            }
            return Ok((parent, index + 1));
        }
        Err(DomError::NotAContainer(point.node))
    }

    fn bold(&mut self, range: Range) -> Result<Vec<NodeId>, CommandError> {
        let runs: Vec<TextRun> = self
            .text_runs(&range)
            .into_iter()
            .filter(|run| !self.is_inside_bold(run.node))
            .collect();

        let mut wrappers = Vec::with_capacity(runs.len());
        // Later runs first so splits never shift an earlier run
        for run in runs.iter().rev() {
            wrappers.push(self.wrap_run(*run, "strong")?);
        }
        wrappers.reverse();

        if let (Some(&first), Some(&last)) = (wrappers.first(), wrappers.last()) {
            let start = Range::wrapping(self, first)?.start;
            let end = Range::wrapping(self, last)?.end;
            self.set_selection(Range::new(start, end));
        }
        Ok(wrappers)
    }

    fn is_inside_bold(&self, id: NodeId) -> bool {
        self.ancestors(id)
            .into_iter()
            .any(|ancestor| matches!(self.tag(ancestor), Some("strong") | Some("b")))
    }

    /// Isolate the run into its own text node and wrap it in a new element.
    fn wrap_run(&mut self, run: TextRun, tag: &str) -> Result<NodeId, DomError> {
        if run.end < self.node_len(run.node) {
            self.split_text(run.node, run.end)?;
        }
        let target = if run.start > 0 {
            self.split_text(run.node, run.start)?
        } else {
            run.node
        };

        let parent = self.parent(target).ok_or(DomError::Detached(target))?;
        let index = self
            .index_in_parent(target)
            .ok_or(DomError::Detached(target))?;
        let wrapper = self.create_element(tag);
        self.insert_child(parent, index, wrapper)?;
        self.append_child(wrapper, target)?;
        Ok(wrapper)
    }
}
