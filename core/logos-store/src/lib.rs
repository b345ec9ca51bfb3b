pub mod data;
pub mod error;
pub mod referrers;
pub mod undo;
pub mod variants;

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

use logos_protocol::WordformId;
use tracing::{debug, warn};

pub use data::{NewBundle, StoreData};
pub use error::{StoreError, StoreResult};
pub use referrers::{EntryCandidate, Obsolete};
pub use undo::{FocusChange, UndoLog, UndoOutcome};
pub use variants::VariantGraph;

use undo::UndoEntry;

/// Mutable view of the store inside one unit of work.
pub struct Transaction<'a> {
    data: &'a mut StoreData,
    focus: Option<FocusChange>,
}

impl<'a> Transaction<'a> {
    /// Attaches a focus command to the unit's undo entry.
    pub fn set_focus(&mut self, focus: FocusChange) {
        self.focus = Some(focus);
    }
}

impl Deref for Transaction<'_> {
    type Target = StoreData;

    fn deref(&self) -> &StoreData {
        self.data
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut StoreData {
        self.data
    }
}

/// The linguistic object store.
///
/// All undoable changes go through [`Store::unit`], which either applies a
/// closure completely or restores the snapshot taken before it ran.
#[derive(Debug, Default)]
pub struct Store {
    data: StoreData,
    log: UndoLog,
    // Wordforms whose analysis set changed and that no observer has drained yet.
    pending: BTreeSet<WordformId>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }

    /// Applies changes outside the undo log (lexicon and text bootstrap).
    ///
    /// Logged snapshots predate such changes, so a setup that changed data
    /// clears the undo and redo history.
    pub fn setup<T>(&mut self, f: impl FnOnce(&mut StoreData) -> T) -> T {
        let revision = self.data.revision;
        let result = f(&mut self.data);
        if self.data.revision != revision && (self.log.can_undo() || self.log.can_redo()) {
            debug!("setup changed data, undo history cleared");
            self.log.clear();
        }
        self.collect_touched();
        result
    }

    /// Runs `f` as one atomic, undoable unit.
    ///
    /// On `Err` every change made by `f` is rolled back. A unit that changed
    /// data gets an undo entry carrying the focus set through
    /// [`Transaction::set_focus`].
    pub fn unit<T, E>(
        &mut self,
        label: &str,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
    {
        let before = self.data.clone();
        self.data.touched.clear();

        let mut tx = Transaction {
            data: &mut self.data,
            focus: None,
        };
        match f(&mut tx) {
            Ok(value) => {
                let focus = tx.focus;
                if self.data.revision != before.revision {
                    let touched = std::mem::take(&mut self.data.touched);
                    self.pending.extend(touched.iter().copied());
                    debug!(label, touched = touched.len(), "unit applied");
                    self.log.push(UndoEntry {
                        label: label.to_string(),
                        before,
                        after: self.data.clone(),
                        touched,
                        focus,
                    });
                }
                Ok(value)
            }
            Err(e) => {
                warn!(label, error = %e, "unit failed, rolling back");
                self.restore(before);
                Err(e)
            }
        }
    }

    /// Swaps in a snapshot while keeping ids and the clock monotonic, so an
    /// id handed out once never comes back for a different object.
    fn restore(&mut self, snapshot: StoreData) {
        let next_id = self.data.next_id;
        let clock = self.data.clock;
        let revision = self.data.revision;
        self.data = snapshot;
        self.data.next_id = self.data.next_id.max(next_id);
        self.data.clock = self.data.clock.max(clock);
        self.data.revision = revision + 1;
        self.data.touched.clear();
    }

    fn collect_touched(&mut self) {
        let touched = std::mem::take(&mut self.data.touched);
        self.pending.extend(touched);
    }

    pub fn undo(&mut self) -> Option<UndoOutcome> {
        let entry = self.log.pop_undo()?;
        self.restore(entry.before.clone());
        self.pending.extend(entry.touched.iter().copied());
        debug!(label = %entry.label, "undo");
        let outcome = UndoOutcome {
            label: entry.label.clone(),
            touched: entry.touched.clone(),
            focus: entry.focus,
        };
        self.log.push_undone(entry);
        Some(outcome)
    }

    pub fn redo(&mut self) -> Option<UndoOutcome> {
        let entry = self.log.pop_redo()?;
        self.restore(entry.after.clone());
        self.pending.extend(entry.touched.iter().copied());
        debug!(label = %entry.label, "redo");
        let outcome = UndoOutcome {
            label: entry.label.clone(),
            touched: entry.touched.clone(),
            focus: entry.focus,
        };
        self.log.push_redone(entry);
        Some(outcome)
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.log.undo_label()
    }

    /// Drains change notifications: wordforms whose analysis set changed
    /// by a unit, setup, undo or redo since the last call.
    pub fn take_changes(&mut self) -> BTreeSet<WordformId> {
        std::mem::take(&mut self.pending)
    }
}
