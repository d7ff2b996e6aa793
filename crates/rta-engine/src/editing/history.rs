//! Undo/redo history of applied commands.
//!
//! Each entry stores the document markup before and after a command. The
//! markup is produced by [`Document::to_html`], which never contains
//! markers, so selection bookkeeping can never leak into the history.

use std::collections::VecDeque;

use crate::dom::{DomError, Document};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    label: &'static str,
    before: String,
    after: String,
}

#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Entry>,
    redo: Vec<Entry>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    pub(crate) fn record(&mut self, label: &'static str, before: String, after: String) {
        self.redo.clear();
        self.undo.push_back(Entry {
            label,
            before,
            after,
        });
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    pub(crate) fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Number of entries that can be undone
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of entries that can be redone
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Labels of the undoable entries, oldest first
    pub fn labels(&self) -> Vec<&'static str> {
        self.undo.iter().map(|entry| entry.label).collect()
    }
}

impl Document {
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Revert the most recent command. Returns false when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> Result<bool, DomError> {
        let Some(entry) = self.history.undo.pop_back() else {
            return Ok(false);
        };
        self.replace_content(&entry.before)?;
        self.version += 1;
        self.history.redo.push(entry);
        Ok(true)
    }

    /// Re-apply the most recently undone command. Returns false when there
    /// is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, DomError> {
        let Some(entry) = self.history.redo.pop() else {
            return Ok(false);
        };
        self.replace_content(&entry.after)?;
        self.version += 1;
        self.history.undo.push_back(entry);
        Ok(true)
    }
}
