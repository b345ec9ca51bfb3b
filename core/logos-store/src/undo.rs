use std::collections::BTreeSet;

use logos_protocol::{OccurrenceRef, WordformId};

use crate::data::StoreData;

/// Navigation focus around a unit: where the user was before it ran and
/// where it sent them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusChange {
    pub before: Option<OccurrenceRef>,
    pub after: Option<OccurrenceRef>,
}

impl FocusChange {
    pub fn new(before: Option<OccurrenceRef>, after: Option<OccurrenceRef>) -> Self {
        Self { before, after }
    }
}

/// One undoable unit: data on both sides plus the focus command.
#[derive(Debug, Clone)]
pub struct UndoEntry {
    pub label: String,
    pub(crate) before: StoreData,
    pub(crate) after: StoreData,
    pub touched: BTreeSet<WordformId>,
    pub focus: Option<FocusChange>,
}

/// What an undo or redo did, for callers that keep derived state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoOutcome {
    pub label: String,
    pub touched: BTreeSet<WordformId>,
    pub focus: Option<FocusChange>,
}

#[derive(Debug, Default)]
pub struct UndoLog {
    undo: Vec<UndoEntry>,
    redo: Vec<UndoEntry>,
}

impl UndoLog {
    pub fn push(&mut self, entry: UndoEntry) {
        self.undo.push(entry);
        self.redo.clear();
    }

    pub fn pop_undo(&mut self) -> Option<UndoEntry> {
        self.undo.pop()
    }

    pub fn pop_redo(&mut self) -> Option<UndoEntry> {
        self.redo.pop()
    }

    pub fn push_undone(&mut self, entry: UndoEntry) {
        self.redo.push(entry);
    }

    pub fn push_redone(&mut self, entry: UndoEntry) {
        self.undo.push(entry);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo.last().map(|e| e.label.as_str())
    }

    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
